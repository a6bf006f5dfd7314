//! Per-key request log for the sliding-window algorithm.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::limiter::Decision;

/// Chronological record of admitted requests for a single client key.
///
/// Timestamps are kept oldest first. Several requests may share the same
/// instant, so duplicates are allowed.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: VecDeque<Instant>,
}

impl RequestLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry strictly older than `now - window`.
    ///
    /// An entry exactly on the boundary is retained, so the effective window
    /// is `[now - window, now]`.
    pub fn prune(&mut self, now: Instant, window: Duration) {
        let Some(cutoff) = now.checked_sub(window) else {
            return;
        };
        while self.entries.front().is_some_and(|&t| t < cutoff) {
            self.entries.pop_front();
        }
    }

    /// Prune, then admit and record `now` if fewer than `max_requests`
    /// entries remain. A rejected request leaves the log untouched.
    pub fn try_admit(&mut self, now: Instant, window: Duration, max_requests: usize) -> Decision {
        self.prune(now, window);

        if self.entries.len() >= max_requests {
            return Decision::Reject;
        }

        self.entries.push_back(now);
        Decision::Admit
    }

    /// Number of recorded requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no requests.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
