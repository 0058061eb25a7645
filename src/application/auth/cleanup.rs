use crate::domain::auth::RefreshTokenRepository;
use crate::shared::error::AppError;
use std::sync::Arc;

#[derive(Debug)]
pub struct CleanupReport {
    pub cleaned_tokens: u64,
}

/// Purge expired and retired refresh tokens on demand. The admin endpoint
/// uses this directly; the background sweeper performs the same pass on its
/// own schedule.
pub struct CleanupTokensUseCase {
    refresh_token_repo: Arc<dyn RefreshTokenRepository>,
}

impl CleanupTokensUseCase {
    pub fn new(refresh_token_repo: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { refresh_token_repo }
    }

    pub async fn execute(&self) -> Result<CleanupReport, AppError> {
        let eligible = self
            .refresh_token_repo
            .count_purgeable()
            .await
            .map_err(AppError::InternalServerError)?;

        if eligible == 0 {
            return Ok(CleanupReport { cleaned_tokens: 0 });
        }

        let cleaned = self
            .refresh_token_repo
            .purge_expired_or_inactive()
            .await
            .map_err(AppError::InternalServerError)?;

        tracing::info!("Cleaned up {} expired tokens", cleaned);
        Ok(CleanupReport {
            cleaned_tokens: cleaned,
        })
    }
}
