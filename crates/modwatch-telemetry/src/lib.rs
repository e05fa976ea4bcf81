//! modwatch Telemetry
//!
//! Engine metrics and credential-safe logging setup.

pub mod metrics;
pub mod redaction;

pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use redaction::{init_tracing, scrub, RedactingMakeWriter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::MetricsCollector;
    pub use crate::redaction::init_tracing;
}
