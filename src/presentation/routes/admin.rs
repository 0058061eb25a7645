use crate::infrastructure::state::AppState;
use crate::presentation::handlers::admin;
use axum::{Router, routing::post};

/// Privileged operational endpoints
pub fn routes() -> Router<AppState> {
    Router::new().route("/cleanup-tokens", post(admin::cleanup_tokens))
}
