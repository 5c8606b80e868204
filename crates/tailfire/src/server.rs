//! HTTP surface: SD endpoint, metrics and health.
//!
//! Routes:
//! - GET /prometheus/targets - run one refresh, answer with target groups
//! - GET /metrics - Prometheus text format of the discovery counters
//! - GET /healthz - liveness probe

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tailfire_core::{Metrics, Refresh};

use crate::error::CliError;

/// Body of every failed discovery response. Upstream details stay in the log.
pub const REFRESH_FAILED_BODY: &str = "an error occurred during discovery refresh";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

struct AppState<R> {
    discovery: Arc<R>,
    metrics: Metrics,
}

pub fn router<R: Refresh>(discovery: Arc<R>, metrics: Metrics) -> Router {
    let state = Arc::new(AppState { discovery, metrics });
    Router::new()
        .route("/prometheus/targets", get(targets::<R>))
        .route("/metrics", get(metrics_text::<R>))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve<R: Refresh>(
    addr: SocketAddr,
    discovery: Arc<R>,
    metrics: Metrics,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::Bind { addr, source })?;
    let local = listener.local_addr().map_err(CliError::Server)?;

    info!(addr = %local, "listening");
    info!("try: curl http://{local}/prometheus/targets");

    axum::serve(listener, router(discovery, metrics))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(CliError::Server)?;

    info!("server stopped");
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /prometheus/targets
async fn targets<R: Refresh>(State(state): State<Arc<AppState<R>>>) -> Response {
    info!("discovery request");
    match state.discovery.refresh().await {
        Ok(groups) => Json(groups).into_response(),
        Err(err) => {
            error!(error = %err, "discovery refresh failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, TEXT_PLAIN)],
                REFRESH_FAILED_BODY,
            )
                .into_response()
        }
    }
}

/// GET /metrics
async fn metrics_text<R: Refresh>(State(state): State<Arc<AppState<R>>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, PROMETHEUS_TEXT)], body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, TEXT_PLAIN)],
                "failed to encode metrics",
            )
                .into_response()
        }
    }
}

/// GET /healthz
async fn healthz() -> &'static str {
    "ok"
}
