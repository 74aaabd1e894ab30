use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use super::registry::ConnectionRegistry;
use crate::models::Envelope;

/// Producer side of the broadcast queue. Cheap to clone.
#[derive(Clone)]
pub struct BroadcastHub {
    tx: mpsc::Sender<Arc<Envelope>>,
}

/// The single consumer that fans queued envelopes out to the registry.
pub struct Dispatcher {
    rx: mpsc::Receiver<Arc<Envelope>>,
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
}

impl BroadcastHub {
    /// A recipient that has not accepted an envelope within `send_timeout`
    /// is treated as failed.
    pub fn new(capacity: usize, send_timeout: Duration, registry: Arc<ConnectionRegistry>) -> (Self, Dispatcher) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let dispatcher = Dispatcher {
            rx,
            registry,
            send_timeout,
        };
        (Self { tx }, dispatcher)
    }

    /// False once the dispatcher has stopped.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue an envelope for every online client.
    ///
    /// Waits while the queue is full rather than dropping. A stalled
    /// dispatcher therefore stalls every publisher.
    pub async fn publish(&self, envelope: Envelope) {
        if let Err(e) = self.tx.send(Arc::new(envelope)).await {
            error!("Broadcast dispatcher is gone, dropping {:?} message", e.0.kind());
        }
    }
}

impl Dispatcher {
    /// Drain the queue until every `BroadcastHub` has been dropped.
    pub async fn run(mut self) {
        while let Some(envelope) = self.rx.recv().await {
            self.fan_out(&envelope).await;
        }
        debug!("Broadcast dispatcher stopped");
    }

    /// Deliver one envelope to the current snapshot. Returns the number of
    /// successful deliveries. Failing recipients are closed and removed.
    pub async fn fan_out(&self, envelope: &Envelope) -> usize {
        let mut delivered = 0;
        for (handle, session) in self.registry.snapshot().await {
            let failure = match timeout(self.send_timeout, handle.send(envelope)).await {
                Ok(Ok(())) => {
                    delivered += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("no progress within {:?}", self.send_timeout),
            };
            warn!("Failed to deliver to {} ({}): {}, closing connection", handle.id(), session.user_id, failure);
            if timeout(self.send_timeout, handle.close()).await.is_err() {
                debug!("Closing {} timed out", handle.id());
            }
            self.registry.unregister(handle.id()).await;
        }
        delivered
    }
}
