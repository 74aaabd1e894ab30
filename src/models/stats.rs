use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Live room statistics
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of authenticated sessions
    pub online: usize,
    /// Whether a shutdown plan is pending
    pub shutdown_scheduled: bool,
    /// Minutes until shutdown, if scheduled
    pub shutdown_remaining_minutes: Option<u64>,
}
