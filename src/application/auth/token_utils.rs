use crate::domain::auth::{NewRefreshToken, RefreshToken, RefreshTokenRepository, TokenIssuer};
use crate::domain::users::User;
use crate::infrastructure::repositories::refresh_tokens::is_unique_violation;
use crate::shared::error::AppError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use time::OffsetDateTime;

/// Raw entropy per refresh token, before encoding.
const REFRESH_TOKEN_BYTES: usize = 64;

/// Regeneration attempts on a token-hash collision. With 64 bytes of
/// entropy a collision is effectively impossible, but the uniqueness
/// invariant is contractual, not probabilistic.
const CREATE_ATTEMPTS: usize = 3;

/// Body returned by login and refresh. The refresh token itself travels in
/// the cookie, never here.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// A freshly issued pair: the response body plus the cookie material.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub access_expires_in: i64,
    pub refresh_token: String,
    pub refresh_expires_at: OffsetDateTime,
}

impl IssuedTokens {
    pub fn into_response(self) -> AccessTokenResponse {
        AccessTokenResponse {
            access_token: self.access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_expires_in,
        }
    }
}

/// Generate an opaque refresh-token secret from the OS entropy source.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate SHA-256 hash of a token string
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue an access token and persist a new refresh token for the user,
/// regenerating the secret on the (negligible) chance of a key collision.
pub async fn issue_token_pair(
    user: &User,
    issuer: &Arc<dyn TokenIssuer>,
    refresh_token_repo: &Arc<dyn RefreshTokenRepository>,
    access_token_ttl_secs: i64,
    refresh_token_ttl_secs: i64,
) -> Result<IssuedTokens, AppError> {
    let access_token = issuer.issue(user).map_err(AppError::InternalServerError)?;

    let (refresh_token, stored) = create_refresh_token(
        user,
        refresh_token_repo,
        refresh_token_ttl_secs,
    )
    .await?;

    Ok(IssuedTokens {
        access_token,
        access_expires_in: access_token_ttl_secs,
        refresh_token,
        refresh_expires_at: stored.expires_at,
    })
}

async fn create_refresh_token(
    user: &User,
    refresh_token_repo: &Arc<dyn RefreshTokenRepository>,
    refresh_token_ttl_secs: i64,
) -> Result<(String, RefreshToken), AppError> {
    let mut last_err = None;

    for _ in 0..CREATE_ATTEMPTS {
        let raw = generate_refresh_token();
        let new_token = NewRefreshToken {
            user_id: user.id,
            token_hash: hash_token(&raw),
            expires_at: OffsetDateTime::now_utc()
                + time::Duration::seconds(refresh_token_ttl_secs),
        };

        match refresh_token_repo.create(new_token).await {
            Ok(stored) => return Ok((raw, stored)),
            Err(e) if is_unique_violation(&e) => {
                last_err = Some(e);
                continue;
            }
            Err(e) => return Err(AppError::InternalServerError(e)),
        }
    }

    Err(AppError::InternalServerError(last_err.unwrap_or_else(
        || anyhow::anyhow!("refresh token creation failed"),
    )))
}
