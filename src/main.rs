use anyhow::Result;
use tracing_subscriber::EnvFilter;

use city_program::config::Config;
use city_program::engine::CityExecutionEngine;
use city_program::node::{RollupClient, RollupNode};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(server_url = %config.server_url, "city rollup node starting");

    let client = RollupClient::new(config.server_url)?;
    let engine: CityExecutionEngine = CityExecutionEngine::new();
    RollupNode::new(client, engine).run()
}
