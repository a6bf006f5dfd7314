//! Rate limiting logic and state management.

mod backend;
mod limiter;
mod log;
mod sweeper;

pub use backend::RateLimiterBackend;
pub use limiter::{Decision, LimitConfig, RateLimiter};
pub use log::RequestLog;
pub use sweeper::spawn_sweeper;
