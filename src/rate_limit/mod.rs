//! Admission control for the HTTP surface.
//!
//! Three cooperating policies guard the service: a keyed global fixed
//! window with a small delay queue, a token bucket dedicated to the auth
//! endpoints, and a segmented sliding window for the general API. A request
//! passes only when every policy applicable to its route admits it, and a
//! rejection looks the same no matter which policy fired.

pub mod fixed_window;
pub mod service;
pub mod sliding_window;
pub mod token_bucket;
pub mod types;

pub use service::RateLimiterService;
pub use types::{Decision, RouteClass};
