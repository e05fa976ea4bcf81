//! Per-source token-bucket rate limiting
//!
//! Buckets refill from elapsed wall-clock time on each call rather than a
//! background timer, so an idle source costs nothing to track. `allow`
//! never blocks the caller.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::debug;

/// Per-source refill state, mutated only under the limiter's lock
#[derive(Debug, Clone, Copy)]
struct RateBudget {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter keyed by source id.
///
/// Buckets are created lazily on first sight of a source. The table is
/// bounded: past `max_sources` the stalest bucket is evicted, losing
/// rate history for an idle source (acceptable, not a correctness issue).
pub struct RateLimiter {
    messages_per_second: f64,
    burst_size: f64,
    max_sources: usize,
    buckets: Mutex<HashMap<String, RateBudget>>,
}

impl RateLimiter {
    pub fn new(messages_per_second: f64, burst_size: u32, max_sources: usize) -> Self {
        Self {
            messages_per_second,
            burst_size: f64::from(burst_size),
            max_sources: max_sources.max(1),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Deduct one token for the source if available.
    ///
    /// Returns `false` without blocking when the budget is exhausted.
    pub fn allow(&self, source_id: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();

        if !buckets.contains_key(source_id) && buckets.len() >= self.max_sources {
            if let Some(stalest) = buckets
                .iter()
                .min_by_key(|(_, budget)| budget.last_refill)
                .map(|(source, _)| source.clone())
            {
                debug!(source = %stalest, "evicting stalest rate bucket");
                buckets.remove(&stalest);
            }
        }

        let budget = buckets.entry(source_id.to_string()).or_insert(RateBudget {
            tokens: self.burst_size,
            last_refill: now,
        });

        let elapsed = now.duration_since(budget.last_refill).as_secs_f64();
        budget.tokens = (budget.tokens + elapsed * self.messages_per_second).min(self.burst_size);
        budget.last_refill = now;

        if budget.tokens >= 1.0 {
            budget.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Number of sources currently tracked
    pub fn tracked_sources(&self) -> usize {
        self.buckets.lock().len()
    }
}
