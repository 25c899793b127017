//! Start command

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tracing::{error, info};

use canopy_config::Config;
use canopy_metrics::SharedRegistry;
use canopy_server::{serve, serve_metrics, AppState};

/// Serve tree submissions until interrupted.
pub async fn run(home_dir: &Path, config: Config) -> Result<()> {
    let registry = SharedRegistry::global().clone();

    let state = AppState::from_config(&config, home_dir, registry.clone())
        .wrap_err("failed to open the tree request store")?;

    info!(
        quorum = config.aggregator.quorum,
        commit_timeout = ?config.aggregator.commit_timeout,
        backend = ?config.storage.backend,
        "Starting canopy"
    );

    if config.metrics.enabled {
        let listen_addr = config.metrics.listen_addr;

        tokio::spawn(async move {
            if let Err(e) = serve_metrics(listen_addr, registry).await {
                error!(%listen_addr, "Metrics server failed: {e}");
            }
        });
    }

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .wrap_err_with(|| format!("failed to listen on {}", config.server.listen_addr))?;

    serve(listener, state, shutdown_signal()).await?;

    info!("Stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => {
            error!("Cannot listen for the shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
