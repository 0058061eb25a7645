use crate::domain::auth::AccessClaims;
use crate::infrastructure::state::AppState;
use crate::shared::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
/// Signature, expiry, issuer and audience are all checked against the
/// issuer built at startup.
pub struct AuthUser {
    pub claims: AccessClaims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed Authorization header".to_string()))?;

        let claims = state
            .issuer
            .verify(token)
            .map_err(|e| AppError::Unauthorized(format!("invalid access token: {e}")))?;

        Ok(AuthUser { claims })
    }
}
