use crate::rate_limit::types::Decision;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Fixed-window counter with a bounded delay queue.
///
/// Up to `limit` requests are admitted per window. When the window is full,
/// up to `queue_limit` further requests reserve a slot in the *next* window
/// and sleep until the boundary instead of being rejected; reservations wake
/// oldest-first. Anything beyond the queue is rejected with the time left in
/// the current window as the retry hint.
pub struct FixedWindow {
    limit: u32,
    window: Duration,
    queue_limit: u32,
    state: Mutex<WindowState>,
}

struct WindowState {
    window_start: Instant,
    admitted: u32,
    reserved_next: u32,
}

impl WindowState {
    fn roll(&mut self, now: Instant, window: Duration) {
        while now >= self.window_start + window {
            self.window_start += window;
            // Queued sleepers wake into the immediately-following window;
            // their reservations become that window's opening count.
            self.admitted = self.reserved_next;
            self.reserved_next = 0;
        }
    }
}

impl FixedWindow {
    pub fn new(limit: u32, window: Duration, queue_limit: u32) -> Self {
        Self {
            limit,
            window,
            queue_limit,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                admitted: 0,
                reserved_next: 0,
            }),
        }
    }

    pub async fn admit(&self) -> Decision {
        let wait = {
            let now = Instant::now();
            let mut state = self.state.lock().unwrap();
            state.roll(now, self.window);

            if state.admitted < self.limit {
                state.admitted += 1;
                return Decision::Admitted;
            }

            let until_boundary = (state.window_start + self.window) - now;
            if state.reserved_next >= self.queue_limit {
                return Decision::Rejected {
                    retry_after: until_boundary,
                };
            }

            state.reserved_next += 1;
            until_boundary
        };

        // The reservation above guarantees a slot once the boundary passes.
        tokio::time::sleep(wait).await;
        Decision::Admitted
    }
}
