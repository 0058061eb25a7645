use crate::domain::users::User;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Claims carried by a signed access token.
///
/// Access tokens are stateless: any node holding the verification key can
/// check them without touching the token store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    /// Unique token id; two tokens never compare equal even when minted
    /// within the same second.
    pub jti: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(user: &User, issuer: &str, audience: &str, ttl_seconds: i64) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name.clone(),
            roles: user.roles.clone(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl_seconds,
        }
    }

    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow::anyhow!("Invalid user ID in claims: {}", e))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// One grant of extended-session capability. Rows are keyed by the SHA-256
/// hash of the raw secret; the raw token only ever lives in the client
/// cookie.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl RefreshToken {
    /// Expiry is read off the clock on every call, never cached on the
    /// instance.
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

/// New refresh token for creation
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: OffsetDateTime,
}

/// Repository trait for the refresh-token store.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a new active token row.
    async fn create(&self, token: NewRefreshToken) -> Result<RefreshToken>;

    /// Find a row by hash, whether or not it is still valid. Callers decide
    /// what to do with retired or expired rows.
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>>;

    /// Flip `is_active` to false. Returns false when the row was already
    /// retired or never existed.
    async fn retire(&self, token_hash: &str) -> Result<bool>;

    /// Atomically retire the presented token and persist its replacement in
    /// one transaction. Returns `None` when the presented token was no
    /// longer active, in which case nothing is written.
    async fn rotate(
        &self,
        presented_hash: &str,
        replacement: NewRefreshToken,
    ) -> Result<Option<RefreshToken>>;

    /// Remove a row outright. Used to narrow the replay window when an
    /// invalid token is presented.
    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool>;

    /// Rows eligible for purging (`expired OR NOT active`).
    async fn count_purgeable(&self) -> Result<i64>;

    /// Delete all purge-eligible rows, returning how many were removed.
    async fn purge_expired_or_inactive(&self) -> Result<u64>;
}

/// Issuer of signed, stateless access tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<String>;
    fn verify(&self, token: &str) -> Result<AccessClaims>;
}
