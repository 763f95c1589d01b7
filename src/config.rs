use anyhow::{Context, Result};

/// Base URL of the rollup coordinating server, e.g. `http://127.0.0.1:5004`.
pub const SERVER_URL_ENV: &str = "ROLLUP_HTTP_SERVER_URL";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
}

impl Config {
    /// Missing configuration is startup-fatal; the node cannot do anything
    /// without a server to poll.
    pub fn from_env() -> Result<Self> {
        let server_url = std::env::var(SERVER_URL_ENV)
            .with_context(|| format!("{SERVER_URL_ENV} must be set to the rollup server url"))?;
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }
}
