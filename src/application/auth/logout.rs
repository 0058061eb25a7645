use crate::application::auth::token_utils::hash_token;
use crate::domain::auth::RefreshTokenRepository;
use crate::shared::error::AppError;
use std::sync::Arc;

/// Retires the presented refresh token. Deliberately forgiving: logging out
/// with a missing or already-retired token still succeeds, the cookie is
/// cleared either way.
pub struct LogoutUseCase {
    refresh_token_repo: Arc<dyn RefreshTokenRepository>,
}

impl LogoutUseCase {
    pub fn new(refresh_token_repo: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { refresh_token_repo }
    }

    pub async fn execute(&self, presented: Option<&str>) -> Result<(), AppError> {
        let Some(presented) = presented else {
            return Ok(());
        };

        let retired = self
            .refresh_token_repo
            .retire(&hash_token(presented))
            .await
            .map_err(AppError::InternalServerError)?;

        if !retired {
            tracing::debug!("Logout presented an unknown or already-retired token");
        }

        Ok(())
    }
}
