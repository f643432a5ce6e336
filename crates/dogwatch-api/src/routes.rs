//! API routes.

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{dashboard, get_frame, get_status, health, list_frames};
use crate::state::AppState;

/// Create the API router.
///
/// Every route is a read: the serving side shares state with the detection
/// loop only through the snapshot publisher and the frame store listing.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/status", get(get_status))
        .route("/frames", get(list_frames));

    Router::new()
        .route("/", get(dashboard))
        .nest("/api", api_routes)
        .route("/frames/:name", get(get_frame))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// CORS layer for the read-only API.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_methods = [Method::GET, Method::OPTIONS];
    let allowed_headers = [header::ACCEPT, header::ORIGIN];

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .allow_origin(Any)
    } else {
        let parsed: Vec<axum::http::HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .allow_origin(parsed)
    }
}
