//! Fixtures shared by the unit and integration suites.

use crate::domain::auth::TokenIssuer;
use crate::domain::password::PasswordHashingService;
use crate::domain::users::User;
use crate::infrastructure::auth::JwtTokenIssuer;
use crate::infrastructure::config::{AppConfig, RateLimitConfig};
use crate::infrastructure::password::PasswordService;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: "keygate-test-signing-secret-0123456789".to_string(),
        jwt_issuer: "keygate".to_string(),
        jwt_audience: "keygate-api".to_string(),
        access_token_ttl_secs: 86_400,
        refresh_token_ttl_secs: 604_800,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        cookie_secure: true,
        sweep_interval_secs: 86_400,
        rate_limits: RateLimitConfig {
            global_limit: 1000,
            global_window_secs: 3600,
            global_queue_limit: 2,
            auth_bucket_capacity: 10,
            auth_refill_tokens: 2,
            auth_refill_period_secs: 60,
            api_limit: 100,
            api_window_secs: 60,
            api_segments: 4,
        },
    }
}

pub fn test_issuer() -> Arc<dyn TokenIssuer> {
    Arc::new(JwtTokenIssuer::new(&test_config()))
}

/// A verified user with an argon2 hash of the given password.
pub fn test_user_with_password(email: &str, password: &str) -> User {
    let hash = PasswordService::new()
        .hash_password(password)
        .expect("test password hash");
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: "Test User".to_string(),
        password_hash: hash,
        email_verified: true,
        roles: vec!["User".to_string()],
        created_at: OffsetDateTime::now_utc(),
        updated_at: OffsetDateTime::now_utc(),
    }
}
