//! Prometheus exposition endpoint (spec.md §6's `metrics_addr`): a bare
//! `GET /metrics` handler rendering the daemon's `Registry` as text, in the
//! teacher's `axum`-fronted style (`cli/src/node.rs`).

use std::net::SocketAddr;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::task::JoinHandle;

async fn metrics(State(registry): State<Registry>) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    if let Err(error) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(%error, "failed to encode metrics");
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "failed to encode metrics",
        )
            .into_response();
    }
    ([(axum::http::header::CONTENT_TYPE, encoder.format_type())], buffer).into_response()
}

/// Binds `addr` and serves `registry` under `/metrics` until the returned
/// task is aborted. Mirrors `fg_rpc::serve`'s bind-then-hand-back-a-handle
/// shape, but as a plain task since axum has no built-in stop handle.
pub async fn spawn(addr: SocketAddr, registry: Registry) -> std::io::Result<JoinHandle<()>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = Router::new()
        .route("/metrics", get(metrics))
        .with_state(registry);

    Ok(tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, app).await {
            tracing::error!(%error, "metrics server exited");
        }
    }))
}
