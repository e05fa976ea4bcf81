//! Scorer trait and common types

use async_trait::async_trait;
use modwatch_core::{ContentItem, Modality, Result, RuleKind, ScoreVector};
use std::time::Duration;

/// Default per-scorer deadline when an implementation does not declare one
pub const DEFAULT_SCORE_TIMEOUT: Duration = Duration::from_millis(500);

/// A pluggable scoring function.
///
/// Implementations declare the modality they accept, the rule kinds they
/// produce, and a latency budget. A scorer that exceeds its budget or
/// faults has its declared kinds marked unknown in the request's score
/// vector — never a crash, never a missing verdict.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Score one content item
    async fn score(&self, item: &ContentItem) -> Result<ScoreVector>;

    /// Get the scorer name
    fn name(&self) -> &str;

    /// Modality this scorer accepts
    fn modality(&self) -> Modality;

    /// Rule kinds this scorer produces confidences for
    fn kinds(&self) -> &[RuleKind];

    /// Declared latency budget
    fn timeout(&self) -> Duration {
        DEFAULT_SCORE_TIMEOUT
    }
}
