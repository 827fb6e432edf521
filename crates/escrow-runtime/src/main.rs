//! # Credit Escrow Runtime Binary
//!
//! Loads configuration from the environment, starts the runtime and waits
//! for Ctrl+C.

use anyhow::{Context, Result};
use tracing::info;

use escrow_runtime::{EscrowRuntime, RuntimeConfig};
use escrow_telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Failed to load configuration")?;

    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;

    let runtime = EscrowRuntime::new(config);
    runtime.start().await?;

    info!("Escrow runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;

    Ok(())
}
