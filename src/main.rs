use std::net::SocketAddr;
use std::panic;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use terminal_chat::config::Config;
use terminal_chat::routes::create_app;
use terminal_chat::services::geo_service::{GeoService, RegionLookup, StaticRegion};
use terminal_chat::AppState;

const GEO_DISABLED: &str = "Region lookup disabled";

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "terminal_chat=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting chat server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    if config.is_production() && config.uses_default_password() {
        warn!("Running in production with the default chat password");
    }

    // Region lookup for connecting clients
    let geo: Arc<dyn RegionLookup> = if config.geo_enabled {
        match GeoService::from_config(&config) {
            Ok(service) => Arc::new(service),
            Err(e) => {
                error!("Failed to initialize geolocation client: {}", e);
                Arc::new(StaticRegion(GEO_DISABLED.to_string()))
            }
        }
    } else {
        warn!("Geolocation disabled - regions will not be resolved");
        Arc::new(StaticRegion(GEO_DISABLED.to_string()))
    };

    let (app, dispatcher) = AppState::new(config, geo);
    tokio::spawn(dispatcher.run());

    let address = app.config.server_address();
    let terminate = app.terminate.clone();
    let app_routes = create_app(app);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    axum::serve(listener, app_routes.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(terminate))
        .await
        .expect("Server failed to start");

    info!("Server stopped");
}

/// Resolves on a completed shutdown plan or Ctrl-C.
async fn shutdown_signal(terminate: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = terminate.notified() => info!("Scheduled shutdown reached"),
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
    }
}
