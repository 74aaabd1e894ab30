use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::transport::{ConnHandle, ConnId};
use crate::models::Session;

/// Authoritative set of online sessions.
///
/// Reads take the shared lock, mutations the exclusive one. No lock is ever
/// held across a transport write: callers iterate a `snapshot` copy.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<BTreeMap<ConnId, (ConnHandle, Session)>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the session for `handle`. Returns the online count.
    pub async fn register(&self, handle: ConnHandle, session: Session) -> usize {
        let mut entries = self.entries.write().await;
        debug!("Registering {} as {}", handle.id(), session.user_id);
        entries.insert(handle.id(), (handle, session));
        entries.len()
    }

    /// Remove `id` if present. Returns whether anything was removed.
    pub async fn unregister(&self, id: ConnId) -> bool {
        let removed = self.entries.write().await.remove(&id).is_some();
        if removed {
            debug!("Unregistered {}", id);
        }
        removed
    }

    /// Mutate an existing session in place. Absent handles are left absent.
    pub async fn update<F>(&self, id: ConnId, f: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        match self.entries.write().await.get_mut(&id) {
            Some((_, session)) => {
                f(session);
                true
            }
            None => false,
        }
    }

    /// Copy of all entries, in connection order.
    pub async fn snapshot(&self) -> Vec<(ConnHandle, Session)> {
        self.entries
            .read()
            .await
            .values()
            .map(|(handle, session)| (handle.clone(), session.clone()))
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::testing::{session, RecordingSink};

    #[tokio::test]
    async fn count_tracks_register_and_unregister() {
        let registry = ConnectionRegistry::new();
        let a = RecordingSink::handle();
        let b = RecordingSink::handle();
        let c = RecordingSink::handle();

        assert_eq!(registry.register(a.0.clone(), session("a")).await, 1);
        assert_eq!(registry.register(b.0.clone(), session("b")).await, 2);
        assert_eq!(registry.register(c.0.clone(), session("c")).await, 3);
        // Re-registering an existing handle replaces, it does not add.
        assert_eq!(registry.register(b.0.clone(), session("b2")).await, 3);

        assert!(registry.unregister(a.0.id()).await);
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (a, _) = RecordingSink::handle();
        let (b, _) = RecordingSink::handle();
        registry.register(a.clone(), session("a")).await;
        registry.register(b.clone(), session("b")).await;

        assert!(registry.unregister(a.id()).await);
        assert!(!registry.unregister(a.id()).await);
        assert_eq!(registry.count().await, 1);
        assert_eq!(registry.snapshot().await[0].1.user_id, "b");
    }

    #[tokio::test]
    async fn snapshot_is_ordered_and_detached() {
        let registry = ConnectionRegistry::new();
        let handles: Vec<_> = (0..4).map(|_| RecordingSink::handle().0).collect();
        for (i, h) in handles.iter().enumerate().rev() {
            registry.register(h.clone(), session(&format!("u{}", i))).await;
        }

        let snap = registry.snapshot().await;
        let ids: Vec<_> = snap.iter().map(|(_, s)| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u0", "u1", "u2", "u3"]);

        registry.unregister(handles[0].id()).await;
        assert_eq!(snap.len(), 4);
        assert_eq!(registry.count().await, 3);
    }

    #[tokio::test]
    async fn update_never_resurrects() {
        let registry = ConnectionRegistry::new();
        let (a, _) = RecordingSink::handle();
        registry.register(a.clone(), session("a")).await;

        assert!(registry.update(a.id(), |s| s.color = "#123456".to_string()).await);
        assert_eq!(registry.snapshot().await[0].1.color, "#123456");

        registry.unregister(a.id()).await;
        assert!(!registry.update(a.id(), |s| s.color = "#000000".to_string()).await);
        assert_eq!(registry.count().await, 0);
    }
}
