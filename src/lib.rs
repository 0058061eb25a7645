pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod rate_limit;
pub mod shared;
pub mod testing;
