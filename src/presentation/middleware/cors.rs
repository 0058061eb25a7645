use crate::infrastructure::config::AppConfig;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// CORS built from the same origin allow-list the rotation engine pins
/// against.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
