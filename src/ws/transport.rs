use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::models::Envelope;

/// Failure on a client's transport. Always terminal for that client only.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed by peer")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(String),
    #[error("unexpected binary frame")]
    UnexpectedBinary,
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Write half of a client connection.
#[async_trait]
pub trait ClientSink: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError>;

    /// Close the transport. Closing twice is harmless.
    async fn close(&self);
}

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Connection identifier, increasing in connection order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnId(u64);

impl ConnId {
    pub fn next() -> Self {
        Self(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Handle to one live connection: its id plus the shared write half.
#[derive(Clone)]
pub struct ConnHandle {
    id: ConnId,
    sink: Arc<dyn ClientSink>,
}

impl ConnHandle {
    pub fn new(sink: Arc<dyn ClientSink>) -> Self {
        Self { id: ConnId::next(), sink }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.sink.send(envelope).await
    }

    pub async fn close(&self) {
        self.sink.close().await
    }
}

impl fmt::Debug for ConnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnHandle").field("id", &self.id).finish()
    }
}
