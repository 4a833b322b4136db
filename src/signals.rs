use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use crate::server::AppState;

/// Shutdown signal types
#[derive(Debug, Clone, Copy)]
pub enum ShutdownSignal {
    /// Graceful shutdown (drain connections, clean up)
    Graceful,
}

/// Setup signal handlers for the server
///
/// Returns a broadcast sender for shutdown signals and a join handle for the signal task
///
/// Handles:
/// - SIGTERM/SIGINT: Graceful shutdown
/// - SIGHUP: Configuration reload
#[cfg(unix)]
pub fn setup_signal_handlers(
    state: AppState,
    config_path: PathBuf,
) -> (broadcast::Sender<ShutdownSignal>, tokio::task::JoinHandle<()>) {
    let (shutdown_tx, _) = broadcast::channel(16);
    let tx_clone = shutdown_tx.clone();

    let handle = tokio::spawn(async move {
        let (mut sigterm, mut sigint, mut sighup) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::hangup()),
        ) {
            (Ok(term), Ok(int), Ok(hup)) => (term, int, hup),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C only");
                wait_for_ctrl_c(&tx_clone).await;
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("SIGTERM received, initiating graceful shutdown");
                    let _ = tx_clone.send(ShutdownSignal::Graceful);
                    break;
                }
                _ = sigint.recv() => {
                    info!("SIGINT received, initiating graceful shutdown");
                    let _ = tx_clone.send(ShutdownSignal::Graceful);
                    break;
                }
                _ = sighup.recv() => {
                    info!("SIGHUP received, reloading configuration");
                    if let Err(e) = reload_config(&state, &config_path) {
                        error!("Failed to reload configuration: {}", e);
                    } else {
                        info!("Configuration reloaded successfully");
                    }
                }
            }
        }
    });

    (shutdown_tx, handle)
}

/// Windows placeholder - only Ctrl+C is supported
#[cfg(not(unix))]
pub fn setup_signal_handlers(
    _state: AppState,
    _config_path: PathBuf,
) -> (broadcast::Sender<ShutdownSignal>, tokio::task::JoinHandle<()>) {
    let (shutdown_tx, _) = broadcast::channel(16);
    let tx_clone = shutdown_tx.clone();

    let handle = tokio::spawn(async move {
        wait_for_ctrl_c(&tx_clone).await;
    });

    (shutdown_tx, handle)
}

async fn wait_for_ctrl_c(tx: &broadcast::Sender<ShutdownSignal>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Ctrl+C received, initiating shutdown");
            let _ = tx.send(ShutdownSignal::Graceful);
        }
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    }
}

/// Reload configuration and everything derived from it
///
/// The new config and price calculator are built first; nothing is swapped
/// unless both succeed. Then the response cache is reset with the new TTLs and
/// the search index is rebuilt.
pub fn reload_config(state: &AppState, config_path: &Path) -> Result<()> {
    info!(path = %config_path.display(), "Loading new configuration...");

    // Phase 1: Load and validate new config
    let new_config = crate::config::load_config(config_path)?;

    // Phase 2: Build the calculator from the new pricing section
    let calculator = new_config
        .pricing
        .build_calculator()
        .map_err(|e| anyhow::anyhow!("Invalid pricing configuration: {}", e))?;

    let old_config = state.config.load();
    if old_config.server.host != new_config.server.host
        || old_config.server.port != new_config.server.port
        || old_config.database.url != new_config.database.url
    {
        warn!("Listen address and database url changes need a restart; keeping the running values");
    }
    if old_config.search.refresh_interval_seconds != new_config.search.refresh_interval_seconds
        || old_config.search.min_query_length != new_config.search.min_query_length
    {
        warn!("Search index settings change on restart only");
    }

    info!(
        default_state = %new_config.pricing.default_state,
        cache_enabled = new_config.cache.enabled,
        "New configuration loaded"
    );

    // Phase 3: Swap, then drop derived state
    state.cache.reconfigure(&new_config.cache);
    state.pricing.store(Arc::new(calculator));
    state.config.store(Arc::new(new_config));
    state.search.invalidate();

    info!("Configuration, pricing and cache swapped; search index rebuild scheduled");
    Ok(())
}
