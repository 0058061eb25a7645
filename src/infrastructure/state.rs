use crate::domain::auth::{RefreshTokenRepository, TokenIssuer};
use crate::domain::password::PasswordHashingService;
use crate::domain::users::UserRepository;
use crate::infrastructure::auth::JwtTokenIssuer;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::DbPool;
use crate::infrastructure::password::PasswordService;
use crate::infrastructure::repositories::refresh_tokens::PostgresRefreshTokenRepository;
use crate::infrastructure::repositories::users::PostgresUserRepository;
use crate::rate_limit::RateLimiterService;
use std::sync::Arc;

/// Application state shared across handlers. Everything here is built once
/// at startup; the collaborators are trait objects so tests can swap in
/// in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub passwords: Arc<dyn PasswordHashingService>,
    pub limiter: Arc<RateLimiterService>,
}

impl AppState {
    /// Production wiring over a Postgres pool.
    pub fn from_pool(pool: DbPool, config: AppConfig) -> Self {
        let config = Arc::new(config);
        Self {
            issuer: Arc::new(JwtTokenIssuer::new(&config)),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            refresh_tokens: Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
            passwords: Arc::new(PasswordService::new()),
            limiter: Arc::new(RateLimiterService::new(config.rate_limits.clone())),
            pool,
            config,
        }
    }
}
