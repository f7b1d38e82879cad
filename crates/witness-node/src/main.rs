//! # Witness Node
//!
//! Starts an in-process federation of witness servers, runs one consensus
//! round across it and reports the decision.

use anyhow::{Context, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use wh_02_consensus::ElectKey;
use witness_node::{Federation, NodeConfig};
use witness_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialize telemetry")?;

    let config = NodeConfig::from_env();
    config.validate().context("invalid node configuration")?;

    let mut federation = Federation::start(config.clone()).context("failed to start federation")?;

    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let key = ElectKey::new("election", format!("election-{started}"), "state");

    let decision = federation
        .run_round(key)
        .await
        .context("consensus round did not complete")?;

    info!(
        decision,
        servers = config.server_count,
        channel = %config.channel_id,
        "Consensus reached"
    );

    federation.shutdown();
    Ok(())
}
