//! Background eviction of idle client keys.
//!
//! Keys are created lazily and would otherwise live for the whole process,
//! so a periodic sweep drops the ones whose window has emptied.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::limiter::RateLimiter;

/// Spawn a task that sweeps `limiter` every `interval`.
///
/// The task runs until it is aborted or the runtime shuts down.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> JoinHandle<()> {
    info!(interval = ?interval, "Starting idle key sweeper");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = limiter.sweep(Instant::now());
            debug!(
                evicted = evicted,
                remaining = limiter.tracked_keys(),
                "Swept idle rate limit keys"
            );
        }
    })
}
