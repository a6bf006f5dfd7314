//! Rate limiter trait for abstracting the decision behind the HTTP adapter.

use std::time::Instant;

use super::limiter::Decision;

/// Trait for rate limiter implementations.
///
/// The HTTP middleware only needs a synchronous admission decision for a
/// client key, so any limiter exposing one can sit behind it.
pub trait RateLimiterBackend: Send + Sync {
    /// Decide whether to admit a request from `key` arriving at `now`.
    fn decide(&self, key: &str, now: Instant) -> Decision;
}
