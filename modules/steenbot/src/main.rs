use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use steenbot::build;
use steenbot_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("steenbot=info".parse()?))
        .init();

    info!("SteenBot starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let runtime = build(&config).await?;
    runtime.bot.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if let Err(e) = runtime.shutdown().await {
        error!(error = %e, "Shutdown finished with errors");
    }

    let status = runtime.bot.status();
    info!(
        events_processed = status.metrics.events_processed,
        errors = status.metrics.errors,
        stored_events = runtime.events.len(),
        "SteenBot exited"
    );
    Ok(())
}
