//! HTTP boundary of the tree submission pipeline.
//!
//! ```text
//! POST /add_tree   - cast a vote for the type of a named tree
//! GET  /health     - liveness probe
//! GET  /metrics    - Prometheus metrics
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use canopy_metrics::SharedRegistry;

pub mod handlers;

mod state;
pub use state::{AppState, SharedAggregator};

/// Build the router serving the submission endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add_tree", post(handlers::add_tree))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::export_metrics))
        .with_state(state)
}

/// Serve the submission endpoint on `listener` until `shutdown` completes.
#[tracing::instrument(name = "server", skip_all)]
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    info!(%address, "Serving tree submissions");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Serve the metrics of `registry` on their own address.
#[tracing::instrument(name = "metrics", skip_all)]
pub async fn serve_metrics(listen_addr: SocketAddr, registry: SharedRegistry) -> io::Result<()> {
    let app = Router::new()
        .route("/metrics", get(handlers::export_metrics))
        .with_state(registry);

    let listener = TcpListener::bind(listen_addr).await?;
    let address = listener.local_addr()?;

    info!(%address, "Serving metrics");
    axum::serve(listener, app).await
}
