use anyhow::Result;
use std::env;

/// Process-wide configuration, resolved once at startup and shared by
/// reference. Nothing re-reads the environment after this.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Access tokens are short-lived; revocation means waiting this out.
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    /// Origins allowed to call the refresh endpoint.
    pub allowed_origins: Vec<String>,
    pub cookie_secure: bool,
    pub sweep_interval_secs: u64,
    pub rate_limits: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub global_limit: u32,
    pub global_window_secs: u64,
    pub global_queue_limit: u32,
    pub auth_bucket_capacity: u32,
    pub auth_refill_tokens: u32,
    pub auth_refill_period_secs: u64,
    pub api_limit: u32,
    pub api_window_secs: u64,
    pub api_segments: u32,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            jwt_secret,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "keygate".to_string()),
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "keygate-api".to_string()),
            access_token_ttl_secs: env_parse("JWT_ACCESS_TOKEN_EXPIRY", 86_400),
            refresh_token_ttl_secs: env_parse("JWT_REFRESH_TOKEN_EXPIRY", 604_800),
            allowed_origins,
            cookie_secure: env_parse("COOKIE_SECURE", true),
            sweep_interval_secs: env_parse("TOKEN_SWEEP_INTERVAL_SECS", 86_400),
            rate_limits: RateLimitConfig::from_env(),
        })
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            global_limit: env_parse("RATE_LIMIT_GLOBAL", 1000),
            global_window_secs: env_parse("RATE_LIMIT_GLOBAL_WINDOW_SECS", 3600),
            global_queue_limit: env_parse("RATE_LIMIT_GLOBAL_QUEUE", 2),
            auth_bucket_capacity: env_parse("RATE_LIMIT_AUTH_CAPACITY", 10),
            auth_refill_tokens: env_parse("RATE_LIMIT_AUTH_REFILL", 2),
            auth_refill_period_secs: env_parse("RATE_LIMIT_AUTH_PERIOD_SECS", 60),
            api_limit: env_parse("RATE_LIMIT_API", 100),
            api_window_secs: env_parse("RATE_LIMIT_API_WINDOW_SECS", 60),
            api_segments: env_parse("RATE_LIMIT_API_SEGMENTS", 4),
        }
    }
}
