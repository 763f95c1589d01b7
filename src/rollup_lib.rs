use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::city::EditingTool;

/// The terminal verdict for one request. This is the only thing the
/// coordinating server learns about how processing went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Accept,
    Reject,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accept => "accept",
            Outcome::Reject => "reject",
        }
    }
}

/// One unit of work handed out by the coordinating server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupRequest {
    pub request_type: RequestKind,
    pub data: AdvanceData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    AdvanceState,
    InspectState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceData {
    pub metadata: RequestMetadata,
    /// Hex-encoded UTF-8 JSON command.
    pub payload: String,
}

/// The server sends more metadata than this (input indices, timestamps);
/// only the sender identity matters here and the rest is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub msg_sender: String,
}

/// A decoded, validated command. Unrecognized methods are carried through as
/// [`Command::Unknown`] rather than failing, since the protocol accepts them
/// as no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateCity,
    DoTool { tool: EditingTool, x: i32, y: i32 },
    Unknown { method: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("payload is not a valid command: {0}")]
    Json(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("field {field} is not an integer: {value}")]
    BadInteger { field: &'static str, value: String },
    #[error("unknown editing tool code: {0}")]
    UnknownTool(i64),
}

/// All command fields arrive as JSON strings and are parsed to typed values
/// here, in one step.
#[derive(Deserialize)]
struct RawCommand {
    method: String,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    y: Option<String>,
}

fn int_field<T: std::str::FromStr>(
    field: &'static str,
    value: Option<String>,
) -> Result<T, CommandError> {
    let value = value.ok_or(CommandError::MissingField(field))?;
    value
        .parse::<T>()
        .map_err(|_| CommandError::BadInteger { field, value })
}

impl Command {
    pub fn parse(text: &str) -> Result<Command, CommandError> {
        let raw: RawCommand =
            serde_json::from_str(text).map_err(|err| CommandError::Json(err.to_string()))?;
        match raw.method.as_str() {
            "createCity" => Ok(Command::CreateCity),
            "doTool" => {
                let code: i64 = int_field("tool", raw.tool)?;
                let tool =
                    EditingTool::from_code(code).ok_or(CommandError::UnknownTool(code))?;
                let x: i32 = int_field("x", raw.x)?;
                let y: i32 = int_field("y", raw.y)?;
                Ok(Command::DoTool { tool, x, y })
            }
            _ => Ok(Command::Unknown { method: raw.method }),
        }
    }
}

/// Everything an accepted or rejected advance resolves to: the outcome plus
/// any notices to publish. Notices are only ever produced alongside
/// [`Outcome::Accept`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    pub outcome: Outcome,
    pub notices: Vec<String>,
}

impl AdvanceResult {
    pub fn accept() -> Self {
        Self {
            outcome: Outcome::Accept,
            notices: vec![],
        }
    }

    pub fn accept_with(notices: Vec<String>) -> Self {
        Self {
            outcome: Outcome::Accept,
            notices,
        }
    }

    pub fn reject() -> Self {
        Self {
            outcome: Outcome::Reject,
            notices: vec![],
        }
    }
}

/// The execution engine resolves decoded requests against its own state.
/// It performs no I/O; publishing the returned notices is the caller's job.
pub trait ExecutionEngine {
    fn advance(&mut self, data: &AdvanceData) -> AdvanceResult;

    /// Read-only. Must not mutate any city.
    fn inspect(&self, data: &AdvanceData) -> Outcome;
}
