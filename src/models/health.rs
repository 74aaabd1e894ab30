use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness or readiness of the chat server
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `unavailable` when the room can no longer deliver messages
    pub status: String,
    pub message: String,
    /// Sessions currently in the room
    pub online: usize,
}

impl HealthResponse {
    pub fn new(ready: bool, online: usize) -> Self {
        let (status, message) = if ready {
            ("ok", format!("{} online", online))
        } else {
            ("unavailable", format!("Room is shutting down, {} online", online))
        };
        Self {
            status: status.to_string(),
            message,
            online,
        }
    }
}
