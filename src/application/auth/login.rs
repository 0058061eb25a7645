use crate::application::auth::token_utils::{IssuedTokens, issue_token_pair};
use crate::domain::auth::{RefreshTokenRepository, TokenIssuer};
use crate::domain::password::PasswordHashingService;
use crate::domain::users::UserRepository;
use crate::shared::error::AppError;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

pub struct LoginUseCase {
    user_repo: Arc<dyn UserRepository>,
    refresh_token_repo: Arc<dyn RefreshTokenRepository>,
    issuer: Arc<dyn TokenIssuer>,
    password_service: Arc<dyn PasswordHashingService>,
    access_token_ttl_secs: i64,
    refresh_token_ttl_secs: i64,
}

impl LoginUseCase {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        refresh_token_repo: Arc<dyn RefreshTokenRepository>,
        issuer: Arc<dyn TokenIssuer>,
        password_service: Arc<dyn PasswordHashingService>,
        access_token_ttl_secs: i64,
        refresh_token_ttl_secs: i64,
    ) -> Self {
        Self {
            user_repo,
            refresh_token_repo,
            issuer,
            password_service,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
        }
    }

    #[tracing::instrument(skip(self, req), fields(email = %req.email))]
    pub async fn execute(&self, req: LoginRequest) -> Result<IssuedTokens, AppError> {
        let user = self
            .user_repo
            .find_by_email(&req.email)
            .await
            .map_err(AppError::InternalServerError)?
            .ok_or_else(|| AppError::Unauthorized("unknown email".to_string()))?;

        let valid_password = self
            .password_service
            .verify_password(&req.password, &user.password_hash)
            .map_err(AppError::InternalServerError)?;

        if !valid_password {
            return Err(AppError::Unauthorized("wrong password".to_string()));
        }

        issue_token_pair(
            &user,
            &self.issuer,
            &self.refresh_token_repo,
            self.access_token_ttl_secs,
            self.refresh_token_ttl_secs,
        )
        .await
    }
}
