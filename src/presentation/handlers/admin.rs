use crate::application::auth::cleanup::CleanupTokensUseCase;
use crate::infrastructure::state::AppState;
use crate::presentation::extractors::AuthUser;
use crate::shared::error::{AppError, ErrorResponse};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// Manually purge expired and retired refresh tokens
#[utoipa::path(
    post,
    path = "/admin/cleanup-tokens",
    responses(
        (status = 200, description = "Cleanup completed"),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn cleanup_tokens(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    if !auth_user.claims.has_role("Admin") {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }

    let use_case = CleanupTokensUseCase::new(state.refresh_tokens.clone());
    let report = use_case.execute().await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("Cleaned up {} expired tokens", report.cleaned_tokens),
            "cleanedTokens": report.cleaned_tokens
        })),
    ))
}
