use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::debug;

use crate::models::StatsResponse;
use crate::ws::shutdown::ShutdownStatus;
use crate::AppState;

/// Online count and pending shutdown
pub async fn stats(State(app): State<Arc<AppState>>) -> Json<StatsResponse> {
    let online = app.registry.count().await;
    let remaining = match app.scheduler.status().await {
        ShutdownStatus::Unscheduled => None,
        ShutdownStatus::Pending { remaining_minutes } => Some(remaining_minutes),
    };
    debug!("Stats requested: {} online", online);

    Json(StatsResponse {
        online,
        shutdown_scheduled: remaining.is_some(),
        shutdown_remaining_minutes: remaining,
    })
}
