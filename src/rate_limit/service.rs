use crate::infrastructure::config::RateLimitConfig;
use crate::rate_limit::fixed_window::FixedWindow;
use crate::rate_limit::sliding_window::SlidingWindow;
use crate::rate_limit::token_bucket::TokenBucket;
use crate::rate_limit::types::{Decision, RouteClass};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Evaluates every policy applicable to a request's route.
///
/// The global fixed window is partitioned by caller identity (bearer subject
/// when verifiable, host header otherwise); the auth bucket and the API
/// window are shared instances guarding their route groups.
pub struct RateLimiterService {
    config: RateLimitConfig,
    global: Mutex<HashMap<String, Arc<FixedWindow>>>,
    auth: TokenBucket,
    api: SlidingWindow,
}

impl RateLimiterService {
    pub fn new(config: RateLimitConfig) -> Self {
        let auth = TokenBucket::new(
            config.auth_bucket_capacity,
            config.auth_refill_tokens,
            Duration::from_secs(config.auth_refill_period_secs),
        );
        let api = SlidingWindow::new(
            config.api_limit,
            Duration::from_secs(config.api_window_secs),
            config.api_segments,
        );

        Self {
            config,
            global: Mutex::new(HashMap::new()),
            auth,
            api,
        }
    }

    /// Admit or reject one request. Policies are evaluated global-first;
    /// the first rejection wins and the caller cannot tell which policy
    /// produced it.
    pub async fn admit(&self, partition_key: &str, route: RouteClass) -> Decision {
        if route == RouteClass::Exempt {
            return Decision::Admitted;
        }

        let global = self.global_window(partition_key);
        let decision = global.admit().await;
        if !decision.is_admitted() {
            return decision;
        }

        match route {
            RouteClass::Auth => self.auth.try_acquire(),
            RouteClass::Api => self.api.try_acquire(),
            RouteClass::Exempt => Decision::Admitted,
        }
    }

    fn global_window(&self, partition_key: &str) -> Arc<FixedWindow> {
        let mut partitions = self.global.lock().unwrap();
        partitions
            .entry(partition_key.to_string())
            .or_insert_with(|| {
                Arc::new(FixedWindow::new(
                    self.config.global_limit,
                    Duration::from_secs(self.config.global_window_secs),
                    self.config.global_queue_limit,
                ))
            })
            .clone()
    }
}
