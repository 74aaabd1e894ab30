use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::HealthResponse;
use crate::AppState;

/// The process is up and serving HTTP.
pub async fn health_check(State(app): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse::new(true, app.registry.count().await))
}

/// Ready while broadcasts can still be delivered and no shutdown has completed.
pub async fn ready_check(State(app): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let online = app.registry.count().await;
    let ready = app.hub.is_running() && !app.scheduler.has_completed();
    if !ready {
        warn!(
            "Readiness check failed: dispatcher running {}, shutdown completed {}",
            app.hub.is_running(),
            app.scheduler.has_completed()
        );
        return (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::new(false, online)));
    }
    debug!("Readiness check requested: {} online", online);
    (StatusCode::OK, Json(HealthResponse::new(true, online)))
}
