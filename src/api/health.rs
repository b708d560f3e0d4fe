/// Health check endpoints for liveness and readiness probes
use crate::{context::AppContext, db, metrics};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;

/// Build health and metrics routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics", get(metrics_endpoint))
}

/// Liveness: if we can respond, we're alive
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness: the database must answer
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = db::test_connection(&ctx.db).await {
        tracing::warn!(error = %e, "readiness_probe_failed: database check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Prometheus text exposition
async fn metrics_endpoint() -> String {
    metrics::render_metrics()
}
