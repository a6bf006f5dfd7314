//! Core rate limiter implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::backend::RateLimiterBackend;
use super::log::RequestLog;
use crate::config::RateLimitingConfig;

/// Default sliding window length.
const DEFAULT_WINDOW: Duration = Duration::from_secs(10);
/// Default number of requests admitted per window.
const DEFAULT_MAX_REQUESTS: usize = 5;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may continue down the pipeline
    Admit,
    /// The key has exhausted its quota for the current window
    Reject,
}

impl Decision {
    /// Whether the request was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit)
    }
}

/// Configuration for a rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitConfig {
    /// How far back request history counts toward the limit
    pub window: Duration,
    /// Maximum admitted requests per key within `window`
    pub max_requests: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

impl From<&RateLimitingConfig> for LimitConfig {
    fn from(config: &RateLimitingConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
        }
    }
}

/// Sliding-window log rate limiter keyed by client identity.
///
/// This struct is thread-safe and can be shared across multiple tasks.
/// Each key owns its own lock, so decisions for different keys never wait
/// on each other.
pub struct RateLimiter {
    /// Request logs indexed by client key
    logs: DashMap<String, Arc<Mutex<RequestLog>>>,
    config: LimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings (5 requests per 10 seconds).
    pub fn new() -> Self {
        Self::with_config(LimitConfig::default())
    }

    /// Create a new rate limiter with the given limit.
    pub fn with_config(config: LimitConfig) -> Self {
        Self {
            logs: DashMap::new(),
            config,
        }
    }

    /// The limit this rate limiter enforces.
    pub fn config(&self) -> LimitConfig {
        self.config
    }

    /// Decide whether to admit a request from `key` arriving at `now`.
    ///
    /// Stale entries are pruned before counting. A rejected request is not
    /// recorded, so it does not extend the time the key stays limited.
    pub fn decide(&self, key: &str, now: Instant) -> Decision {
        let log = self.log_for(key);

        let (decision, in_window) = {
            let mut log = log.lock();
            let decision = log.try_admit(now, self.config.window, self.config.max_requests);
            (decision, log.len())
        };

        trace!(
            key = %key,
            decision = ?decision,
            in_window = in_window,
            "Rate limit decision"
        );

        if decision == Decision::Reject {
            debug!(
                key = %key,
                limit = self.config.max_requests,
                window = ?self.config.window,
                "Rate limit exceeded"
            );
        }

        decision
    }

    /// Get or atomically create the log for `key`.
    ///
    /// The map shard guard is dropped before the caller locks the log.
    fn log_for(&self, key: &str) -> Arc<Mutex<RequestLog>> {
        if let Some(log) = self.logs.get(key) {
            return Arc::clone(&log);
        }

        let entry = self.logs.entry(key.to_string()).or_insert_with(|| {
            trace!(key = %key, "Creating new request log");
            Arc::new(Mutex::new(RequestLog::new()))
        });
        Arc::clone(&entry)
    }

    /// Evict keys with no requests in the last two windows.
    ///
    /// A log that an in-flight decision still holds is never removed, so a
    /// sweep cannot let a key exceed its limit. Callers pick their own `now`,
    /// so a decision may carry a timestamp slightly older than the sweep's;
    /// pruning against `now - window` keeps every entry such a decision could
    /// still count. Returns the number of keys evicted.
    pub fn sweep(&self, now: Instant) -> usize {
        let window = self.config.window;
        let Some(horizon) = now.checked_sub(window) else {
            return 0;
        };
        let before = self.logs.len();

        self.logs.retain(|_, log| {
            if Arc::strong_count(log) > 1 {
                return true;
            }
            let mut log = log.lock();
            log.prune(horizon, window);
            !log.is_empty()
        });

        before.saturating_sub(self.logs.len())
    }

    /// Get the number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    /// Clear all request logs.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.logs.clear();
    }

    #[cfg(test)]
    fn log_len(&self, key: &str) -> Option<usize> {
        self.logs.get(key).map(|log| log.lock().len())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterBackend for RateLimiter {
    fn decide(&self, key: &str, now: Instant) -> Decision {
        RateLimiter::decide(self, key, now)
    }
}
