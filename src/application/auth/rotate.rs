use crate::application::auth::token_utils::{
    IssuedTokens, generate_refresh_token, hash_token,
};
use crate::domain::auth::{NewRefreshToken, RefreshTokenRepository, TokenIssuer};
use crate::domain::users::UserRepository;
use crate::shared::error::AppError;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

/// Why a rotation was refused. Externally every variant except
/// `Infrastructure` renders as the same generic 401; the distinction only
/// drives logging and cookie clearing.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("refresh token missing")]
    MissingToken,
    #[error("request origin not allowed")]
    OriginRejected,
    #[error("refresh token unknown")]
    UnknownToken,
    #[error("refresh token expired or retired")]
    InvalidToken,
    #[error("token owner missing or unverified")]
    IneligibleUser,
    #[error("refresh token was already rotated")]
    AlreadyRotated,
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl RotationError {
    /// A stale cookie should be dropped by the client when the row backing
    /// it is gone or unusable.
    pub fn should_clear_cookie(&self) -> bool {
        matches!(
            self,
            RotationError::InvalidToken
                | RotationError::AlreadyRotated
                | RotationError::UnknownToken
        )
    }
}

impl From<RotationError> for AppError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::Infrastructure(e) => AppError::InternalServerError(e),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// Refresh-token rotation: validate the presented token, atomically retire
/// it and create its replacement, then issue a fresh access token.
pub struct RotateTokenUseCase {
    user_repo: Arc<dyn UserRepository>,
    refresh_token_repo: Arc<dyn RefreshTokenRepository>,
    issuer: Arc<dyn TokenIssuer>,
    allowed_origins: Vec<String>,
    access_token_ttl_secs: i64,
    refresh_token_ttl_secs: i64,
}

impl RotateTokenUseCase {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        refresh_token_repo: Arc<dyn RefreshTokenRepository>,
        issuer: Arc<dyn TokenIssuer>,
        allowed_origins: Vec<String>,
        access_token_ttl_secs: i64,
        refresh_token_ttl_secs: i64,
    ) -> Self {
        Self {
            user_repo,
            refresh_token_repo,
            issuer,
            allowed_origins,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn execute(
        &self,
        presented: Option<&str>,
        origin: Option<&str>,
    ) -> Result<IssuedTokens, RotationError> {
        let presented = presented.ok_or(RotationError::MissingToken)?;

        // Origin pinning: a refresh cookie replayed from a foreign site is
        // rejected before the store is touched.
        let origin = origin.ok_or(RotationError::OriginRejected)?;
        if !self.allowed_origins.iter().any(|o| o == origin) {
            return Err(RotationError::OriginRejected);
        }

        let presented_hash = hash_token(presented);
        let stored = self
            .refresh_token_repo
            .find_by_hash(&presented_hash)
            .await?
            .ok_or(RotationError::UnknownToken)?;

        if !stored.is_valid() {
            // Retired or expired rows are evidence of replay or drift;
            // removing them immediately narrows the replay window instead of
            // waiting for the sweeper.
            self.refresh_token_repo
                .delete_by_hash(&presented_hash)
                .await?;
            return Err(RotationError::InvalidToken);
        }

        let user = self
            .user_repo
            .find_by_id(stored.user_id)
            .await?
            .filter(|u| u.email_verified)
            .ok_or(RotationError::IneligibleUser)?;

        let raw_replacement = generate_refresh_token();
        let replacement = NewRefreshToken {
            user_id: user.id,
            token_hash: hash_token(&raw_replacement),
            expires_at: OffsetDateTime::now_utc()
                + time::Duration::seconds(self.refresh_token_ttl_secs),
        };

        // Retire-and-create is one transaction; of two concurrent rotations
        // with the same token, exactly one gets a row back.
        let created = self
            .refresh_token_repo
            .rotate(&presented_hash, replacement)
            .await?
            .ok_or(RotationError::AlreadyRotated)?;

        let access_token = self.issuer.issue(&user)?;

        Ok(IssuedTokens {
            access_token,
            access_expires_in: self.access_token_ttl_secs,
            refresh_token: raw_replacement,
            refresh_expires_at: created.expires_at,
        })
    }
}
