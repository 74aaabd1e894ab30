//! In-memory transports for unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::transport::{ClientSink, ConnHandle, TransportError};
use crate::models::{Envelope, MessageKind, Session};

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Envelope>>,
    failing: AtomicBool,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn handle() -> (ConnHandle, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (ConnHandle::new(sink.clone()), sink)
    }

    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn of_kind(&self, kind: MessageKind) -> Vec<Envelope> {
        self.sent().into_iter().filter(|e| e.kind() == kind).collect()
    }

    /// Poll until `pred` holds over everything received so far.
    pub async fn wait_for<F>(&self, pred: F) -> Vec<Envelope>
    where
        F: Fn(&[Envelope]) -> bool,
    {
        for _ in 0..200 {
            let sent = self.sent();
            if pred(&sent) {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met, received: {:#?}", self.sent());
    }
}

#[async_trait]
impl ClientSink for RecordingSink {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) || self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A peer that never accepts a write.
#[derive(Default)]
pub struct StalledSink {
    closed: AtomicBool,
}

impl StalledSink {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientSink for StalledSink {
    async fn send(&self, _envelope: &Envelope) -> Result<(), TransportError> {
        std::future::pending().await
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub fn session(user_id: &str) -> Session {
    Session {
        user_id: user_id.to_string(),
        raw_ip: "203.0.113.7".to_string(),
        masked_ip: "203.0.113.*".to_string(),
        region: "Springfield".to_string(),
        color: "#00ff00".to_string(),
    }
}
