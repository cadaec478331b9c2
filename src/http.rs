//! HTTP endpoint for Prometheus scraping and liveness checks.
//!
//! - `GET /metrics`: Prometheus text format
//! - `GET /healthz`: `200 registered` while the IRC link is registered,
//!   `503 link down` otherwise

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::session::LinkStatus;

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler(State(status): State<LinkStatus>) -> (StatusCode, &'static str) {
    if status.is_up() {
        (StatusCode::OK, "registered")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "link down")
    }
}

pub fn router(status: LinkStatus) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(health_handler))
        .with_state(status)
}

/// Serve on an already-bound listener until the server fails.
pub async fn serve(listener: TcpListener, status: LinkStatus) -> std::io::Result<()> {
    axum::serve(listener, router(status)).await
}

/// Bind `addr` and serve. Bind and serve failures are logged, not returned.
pub async fn run_http_server(addr: SocketAddr, status: LinkStatus) {
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind HTTP endpoint");
            return;
        }
    };
    tracing::info!(%addr, "HTTP endpoint listening");

    if let Err(e) = serve(listener, status).await {
        tracing::error!(error = %e, "HTTP endpoint failed");
    }
}
