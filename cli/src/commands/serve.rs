use anyhow::{Context, Result};
use api::{ApiConfig, AppState};
use authz::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::bootstrap;
use crate::config::WardenConfig;
use crate::logging;

/// Run the HTTP server until Ctrl-C.
pub async fn execute(config: WardenConfig, verbose: bool) -> Result<()> {
    let _guard = logging::init_server_logging(&config.logging, verbose)?;
    info!("=== warden starting ===");

    let bootstrap = bootstrap::build(&config).await?;
    spawn_event_logger(&bootstrap.events);

    let api_config = ApiConfig::new()
        .with_host(config.server.host.clone())
        .with_port(config.server.port);

    api::start_server(AppState::new(bootstrap.service), api_config, shutdown_signal())
        .await
        .context("API server failed")?;

    info!("=== warden shutdown complete ===");
    Ok(())
}

fn spawn_event_logger(events: &EventBus) {
    let mut receiver = events.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(
                    added = ?event.added,
                    removed = ?event.removed,
                    "Principals changed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Principal change events dropped")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
