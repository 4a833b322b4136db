use anyhow::Result;
use car_catalog::{config, server};
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// Loads configuration and runs the server until a shutdown signal arrives
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting car catalog...".green());

    let cfg = config::load_config(config_path)?;
    info!(
        config = %config_path.display(),
        host = %cfg.server.host,
        port = cfg.server.port,
        "Starting car catalog"
    );

    // Start the server (blocks until shutdown)
    server::start_server(cfg, config_path.to_path_buf()).await?;

    Ok(())
}
