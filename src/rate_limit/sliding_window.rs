use crate::rate_limit::types::Decision;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Sliding window split into fixed segments.
///
/// Counts are bucketed per segment; a request is admitted while the sum over
/// the segments covering the trailing window stays under the limit. The
/// segmentation closes the boundary-burst hole of a plain fixed window
/// without keeping a timestamp per request.
pub struct SlidingWindow {
    limit: u32,
    segment_len: Duration,
    segments: u32,
    state: Mutex<VecDeque<Segment>>,
}

struct Segment {
    start: Instant,
    count: u32,
}

impl SlidingWindow {
    pub fn new(limit: u32, window: Duration, segments: u32) -> Self {
        Self {
            limit,
            segment_len: window / segments.max(1),
            segments: segments.max(1),
            state: Mutex::new(VecDeque::new()),
        }
    }

    fn window(&self) -> Duration {
        self.segment_len * self.segments
    }

    pub fn try_acquire(&self) -> Decision {
        let now = Instant::now();
        let window = self.window();
        let mut segments = self.state.lock().unwrap();

        // Segments that slid fully out of the trailing window stop counting.
        while let Some(front) = segments.front() {
            if front.start + window <= now {
                segments.pop_front();
            } else {
                break;
            }
        }

        let in_window: u32 = segments.iter().map(|s| s.count).sum();
        if in_window >= self.limit {
            let retry_after = segments
                .front()
                .map(|oldest| (oldest.start + window) - now)
                .unwrap_or(self.segment_len);
            return Decision::Rejected { retry_after };
        }

        let in_current_segment = segments
            .back()
            .is_some_and(|current| now < current.start + self.segment_len);

        if in_current_segment {
            if let Some(current) = segments.back_mut() {
                current.count += 1;
            }
        } else {
            // Align the new segment to the grid set by the previous one so
            // idle gaps do not shift segment boundaries arbitrarily.
            let start = match segments.back() {
                Some(last) => {
                    let mut start = last.start;
                    while start + self.segment_len <= now {
                        start += self.segment_len;
                    }
                    start
                }
                None => now,
            };
            segments.push_back(Segment { start, count: 1 });
        }

        Decision::Admitted
    }
}
