use crate::rate_limit::types::Decision;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Token bucket with lazy refill.
///
/// The bucket starts full. Each admission costs one token; `refill_tokens`
/// are credited per `refill_period`, computed on demand from the elapsed
/// time rather than by a background task. Sized small to blunt
/// credential-stuffing and refresh-token brute force against the auth
/// endpoints.
pub struct TokenBucket {
    capacity: u32,
    refill_tokens: u32,
    refill_period: Duration,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_tokens: u32, refill_period: Duration) -> Self {
        Self {
            capacity,
            refill_tokens,
            refill_period,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn try_acquire(&self) -> Decision {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();

        let elapsed = now - state.last_refill;
        let periods = (elapsed.as_nanos() / self.refill_period.as_nanos().max(1))
            .min(u128::from(u32::MAX)) as u32;
        if periods > 0 {
            state.tokens = state
                .tokens
                .saturating_add(periods.saturating_mul(self.refill_tokens))
                .min(self.capacity);
            state.last_refill += self.refill_period * periods;
        }

        if state.tokens > 0 {
            state.tokens -= 1;
            Decision::Admitted
        } else {
            Decision::Rejected {
                retry_after: (state.last_refill + self.refill_period) - now,
            }
        }
    }
}
