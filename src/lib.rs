pub mod clients;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod websocket;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use config::Config;
use services::geo_service::RegionLookup;
use ws::hub::{BroadcastHub, Dispatcher};
use ws::registry::ConnectionRegistry;
use ws::shutdown::ShutdownScheduler;

/// Shared state of one running chat server.
pub struct AppState {
    pub config: Config,
    pub registry: Arc<ConnectionRegistry>,
    pub hub: BroadcastHub,
    pub scheduler: ShutdownScheduler,
    pub geo: Arc<dyn RegionLookup>,
    /// Notified once a shutdown plan has run to completion.
    pub terminate: Arc<Notify>,
}

impl AppState {
    /// Wire up the registry, hub and scheduler. The returned dispatcher
    /// must be spawned for broadcasts to be delivered.
    pub fn new(config: Config, geo: Arc<dyn RegionLookup>) -> (Arc<Self>, Dispatcher) {
        let registry = Arc::new(ConnectionRegistry::new());
        let (hub, dispatcher) = BroadcastHub::new(
            config.broadcast_capacity,
            Duration::from_millis(config.send_timeout_ms),
            registry.clone(),
        );
        let terminate = Arc::new(Notify::new());
        let scheduler = ShutdownScheduler::new(
            hub.clone(),
            registry.clone(),
            terminate.clone(),
            Duration::from_millis(config.shutdown_grace_ms),
        );

        let state = Self {
            config,
            registry,
            hub,
            scheduler,
            geo,
            terminate,
        };
        (Arc::new(state), dispatcher)
    }
}
