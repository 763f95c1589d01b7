use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::rollup_lib::{ExecutionEngine, Outcome, RequestKind, RollupRequest};

/// Matches the read timeout the coordinating server expects its clients to
/// hold while a request is pending.
const READ_TIMEOUT: Duration = Duration::from_secs(20);

const RETRY_ATTEMPTS: u32 = 8;
const RETRY_BASE: Duration = Duration::from_millis(500);
const RETRY_CAP: Duration = Duration::from_secs(8);

/// The coordinating server could not be reached or answered with something
/// that is not a request envelope. The only error class that escalates out
/// of the poll loop.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rollup server request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("rollup server returned an unparseable body: {0}")]
    BadBody(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct FinishBody<'a> {
    status: &'a str,
}

#[derive(Serialize)]
struct PayloadBody<'a> {
    payload: &'a str,
}

/// Blocking HTTP transport to the coordinating server's finish, notice, and
/// report endpoints.
pub struct RollupClient {
    base: String,
    client: Client,
}

impl RollupClient {
    pub fn new(base: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(READ_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self { base, client })
    }

    /// Reports the previous outcome and picks up the next pending request,
    /// if any.
    pub fn finish(&self, status: Outcome) -> Result<Option<RollupRequest>, TransportError> {
        let response = self
            .client
            .post(format!("{}/finish", self.base))
            .json(&FinishBody {
                status: status.as_str(),
            })
            .send()?;
        let status_code = response.status();
        debug!(status = %status_code, "finish response");
        let body = response.bytes()?;
        classify_finish(status_code, &body)
    }

    pub fn create_notice(&self, payload: &str) {
        self.emit("notice", payload);
    }

    pub fn create_report(&self, payload: &str) {
        self.emit("report", payload);
    }

    // fire and forget: a lost artifact is logged, never escalated
    fn emit(&self, endpoint: &str, payload: &str) {
        let result = self
            .client
            .post(format!("{}/{endpoint}", self.base))
            .json(&PayloadBody { payload })
            .send();
        match result {
            Ok(response) if response.status() == StatusCode::CREATED => {
                debug!(endpoint, "artifact created");
            }
            Ok(response) => {
                warn!(endpoint, status = %response.status(), "artifact was not created");
            }
            Err(err) => {
                warn!(endpoint, %err, "failed to reach rollup server");
            }
        }
    }
}

/// A 202 means no request is pending and the body carries nothing; any other
/// response body is the next request envelope.
fn classify_finish(
    status: StatusCode,
    body: &[u8],
) -> Result<Option<RollupRequest>, TransportError> {
    if status == StatusCode::ACCEPTED {
        return Ok(None);
    }
    let request = serde_json::from_slice::<RollupRequest>(body)?;
    Ok(Some(request))
}

/// The node's single perpetual cycle: report the previous outcome, wait for
/// the next request, dispatch it, repeat. Terminates only on an exhausted
/// transport retry budget.
pub struct RollupNode<X> {
    client: RollupClient,
    engine: X,
}

impl<X: ExecutionEngine> RollupNode<X> {
    pub fn new(client: RollupClient, engine: X) -> Self {
        Self { client, engine }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut status = Outcome::Accept;
        loop {
            let Some(request) = self.finish_with_retry(status)? else {
                debug!("no pending rollup request, polling again");
                continue;
            };
            status = self.handle(&request);
        }
    }

    /// Dispatches one request envelope and returns the outcome to report on
    /// the next finish call.
    fn handle(&mut self, request: &RollupRequest) -> Outcome {
        match request.request_type {
            RequestKind::AdvanceState => {
                let result = self.engine.advance(&request.data);
                for notice in &result.notices {
                    self.client.create_notice(notice);
                }
                info!(outcome = result.outcome.as_str(), "advance handled");
                result.outcome
            }
            RequestKind::InspectState => self.engine.inspect(&request.data),
        }
    }

    /// The cycle must not advance past a transport failure: retry with
    /// exponential backoff, then surface a fatal error once the budget is
    /// spent.
    fn finish_with_retry(&self, status: Outcome) -> Result<Option<RollupRequest>> {
        let mut delay = RETRY_BASE;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.finish(status) {
                Ok(next) => return Ok(next),
                Err(err) => {
                    if attempt >= RETRY_ATTEMPTS {
                        return Err(anyhow::Error::new(err)
                            .context("retry budget exhausted while reporting status"));
                    }
                    warn!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "finish failed, retrying");
                    std::thread::sleep(delay);
                    delay = (delay * 2).min(RETRY_CAP);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup_lib::{AdvanceData, AdvanceResult, RequestMetadata};

    #[test]
    fn finish_body_wire_shape() {
        let body = serde_json::to_string(&FinishBody { status: "accept" }).unwrap();
        assert_eq!(body, r#"{"status":"accept"}"#);
    }

    #[test]
    fn payload_body_escapes_embedded_text() {
        let body = serde_json::to_string(&PayloadBody {
            payload: "say \"hi\"\n",
        })
        .unwrap();
        assert_eq!(body, r#"{"payload":"say \"hi\"\n"}"#);
    }

    #[test]
    fn accepted_status_means_no_pending_request() {
        // the body must not be parsed at all on a 202
        let next = classify_finish(StatusCode::ACCEPTED, b"definitely not json").unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn other_statuses_carry_the_next_envelope() {
        let body = br#"{
            "request_type": "advance_state",
            "data": {
                "metadata": { "msg_sender": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266" },
                "payload": "0x7b7d"
            }
        }"#;
        let next = classify_finish(StatusCode::OK, body).unwrap().unwrap();
        assert_eq!(next.request_type, RequestKind::AdvanceState);
    }

    #[test]
    fn unparseable_envelope_is_a_transport_error() {
        let result = classify_finish(StatusCode::OK, b"<html>oops</html>");
        assert!(matches!(result, Err(TransportError::BadBody(_))));
    }

    /// Canned engine for driving `handle` without a server.
    struct ScriptedEngine {
        result: AdvanceResult,
        advanced: u32,
    }

    impl ExecutionEngine for ScriptedEngine {
        fn advance(&mut self, _data: &AdvanceData) -> AdvanceResult {
            self.advanced += 1;
            self.result.clone()
        }

        fn inspect(&self, _data: &AdvanceData) -> Outcome {
            Outcome::Accept
        }
    }

    fn request(kind: RequestKind) -> RollupRequest {
        RollupRequest {
            request_type: kind,
            data: AdvanceData {
                metadata: RequestMetadata {
                    msg_sender: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
                },
                payload: "0x7b7d".to_string(),
            },
        }
    }

    #[test]
    fn handle_routes_by_request_kind_and_swallows_notice_failures() {
        // nothing listens here, so notice posting fails; the outcome must
        // come through regardless
        let client = RollupClient::new("http://127.0.0.1:1".to_string()).unwrap();
        let engine = ScriptedEngine {
            result: AdvanceResult::accept_with(vec!["0xbeef".to_string()]),
            advanced: 0,
        };
        let mut node = RollupNode::new(client, engine);

        assert_eq!(node.handle(&request(RequestKind::AdvanceState)), Outcome::Accept);
        assert_eq!(node.engine.advanced, 1);

        assert_eq!(node.handle(&request(RequestKind::InspectState)), Outcome::Accept);
        assert_eq!(node.engine.advanced, 1);
    }

    #[test]
    fn handle_reports_rejections() {
        let client = RollupClient::new("http://127.0.0.1:1".to_string()).unwrap();
        let engine = ScriptedEngine {
            result: AdvanceResult::reject(),
            advanced: 0,
        };
        let mut node = RollupNode::new(client, engine);
        assert_eq!(node.handle(&request(RequestKind::AdvanceState)), Outcome::Reject);
    }
}
