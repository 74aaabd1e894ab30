pub mod api;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeFile,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::docs::ApiDoc;
use crate::websocket::websocket_handler;
use crate::AppState;
use api::create_api_routes;

/// Build the full application router.
pub fn create_app(app: Arc<AppState>) -> Router {
    let cors = cors_layer(&app.config);
    Router::new()
        // Chat socket
        .route("/ws", get(websocket_handler))
        // Client page
        .route_service("/", ServeFile::new(&app.config.index_path))
        // Mount API routes
        .nest("/api", create_api_routes())
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = match config.cors_origin_list() {
        Some(list) => AllowOrigin::list(list.iter().filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })),
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
