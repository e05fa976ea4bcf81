//! Metrics collection and reporting

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for the moderation engine.
///
/// Backs the health surface with relaxed atomics and mirrors the counts
/// into the `metrics` facade for whatever recorder the host installs.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    violations: AtomicU64,
    degraded_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                total_requests: AtomicU64::new(0),
                cache_hits: AtomicU64::new(0),
                violations: AtomicU64::new(0),
                degraded_requests: AtomicU64::new(0),
                rejected_requests: AtomicU64::new(0),
            }),
        }
    }

    /// Record an inbound moderation request
    pub fn record_request(&self) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modwatch_requests_total").increment(1);
    }

    /// Record a verdict served from the cache
    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modwatch_cache_hits_total").increment(1);
    }

    /// Record a violating verdict
    pub fn record_violation(&self, kind: &'static str) {
        self.inner.violations.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modwatch_violations_total", "kind" => kind).increment(1);
    }

    /// Record a verdict produced with one or more failed scorers
    pub fn record_degraded(&self) {
        self.inner.degraded_requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modwatch_degraded_total").increment(1);
    }

    /// Record an input rejected by validation
    pub fn record_rejected(&self) {
        self.inner.rejected_requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modwatch_rejected_total").increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.inner.total_requests.load(Ordering::Relaxed),
            cache_hits: self.inner.cache_hits.load(Ordering::Relaxed),
            violations: self.inner.violations.load(Ordering::Relaxed),
            degraded_requests: self.inner.degraded_requests.load(Ordering::Relaxed),
            rejected_requests: self.inner.rejected_requests.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub violations: u64,
    pub degraded_requests: u64,
    pub rejected_requests: u64,
}

impl MetricsSnapshot {
    /// Fraction of requests that completed degraded
    pub fn degraded_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.degraded_requests as f64 / self.total_requests as f64
        }
    }

    /// Fraction of requests served from the cache
    pub fn cache_hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}
