//! Moderation orchestrator
//!
//! Drives one request through validate → cache lookup → scoring fan-out →
//! aggregation → rate check, and returns a verdict. Scoring units run on a
//! bounded worker pool shared across requests, each under its scorer's
//! declared timeout; aggregation starts only after every unit has settled
//! or timed out, so timeouts are the only source of partial results.

use futures::future::join_all;
use modwatch_core::{
    ContentItem, Error, Modality, ModerationResult, Result, RuleAction, RuleKind, ScoreVector,
};
use modwatch_policy::{ParseError, Policy, PolicyStore, Rule, RuleSpec};
use modwatch_scoring::{FrameSampler, Scorer, ScorerRegistry};
use modwatch_telemetry::MetricsCollector;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::VerdictCache;
use crate::config::EngineConfig;
use crate::limiter::RateLimiter;
use crate::patterns::{ThreatDetector, ThreatPattern};
use crate::secrets::{SecretManager, SecretString};
use crate::validate::InputValidator;

/// Window the threat detector looks back over
const THREAT_WINDOW: std::time::Duration = std::time::Duration::from_secs(300);

/// Health snapshot for operational tooling. A pure read.
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub cache_size: usize,
    pub degraded_request_rate: f64,
}

/// Outcome of one scoring unit
enum ScorerOutcome {
    Scored(ScoreVector),
    Failed(Vec<RuleKind>),
}

/// The moderation engine's single call surface.
///
/// One instance is shared across all inbound traffic; every piece of
/// mutable state sits behind its own narrow lock.
pub struct Moderator {
    config: EngineConfig,
    validator: InputValidator,
    cache: VerdictCache,
    limiter: RateLimiter,
    registry: Arc<ScorerRegistry>,
    policy: PolicyStore,
    pool: Arc<Semaphore>,
    sampler: FrameSampler,
    threats: ThreatDetector,
    metrics: MetricsCollector,
    secrets: Option<SecretManager>,
    credential: Mutex<Option<Vec<u8>>>,
}

impl Moderator {
    /// Build an engine from configuration, an active policy, and a
    /// scorer registry.
    pub fn new(config: EngineConfig, policy: Policy, registry: ScorerRegistry) -> Self {
        let validator = InputValidator::new(config.limits);
        let cache = VerdictCache::new(config.cache_capacity);
        let limiter = RateLimiter::new(
            config.messages_per_second,
            config.burst_size,
            config.max_sources,
        );
        let pool = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        let sampler = FrameSampler::new(config.max_frames);

        info!(
            rules = policy.len(),
            scorers = registry.len(),
            workers = config.max_concurrency.max(1),
            "moderation engine initialized"
        );

        Self {
            config,
            validator,
            cache,
            limiter,
            registry: Arc::new(registry),
            policy: PolicyStore::new(policy),
            pool,
            sampler,
            threats: ThreatDetector::new(THREAT_WINDOW),
            metrics: MetricsCollector::new(),
            secrets: None,
            credential: Mutex::new(None),
        }
    }

    /// Attach a secret manager for credential sealing
    pub fn with_secret_manager(mut self, secrets: SecretManager) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Moderate one content item.
    ///
    /// Always resolves to a verdict or a typed rejection; request-scoped
    /// scorer failures degrade the verdict instead of failing the call.
    pub async fn moderate(&self, item: ContentItem) -> Result<ModerationResult> {
        let started = Instant::now();
        self.metrics.record_request();

        // VALIDATING: a rejected item schedules nothing downstream
        if let Err(reason) = self.validator.validate(&item) {
            self.metrics.record_rejected();
            warn!(source = %item.source_id, %reason, "rejected inbound item");
            return Err(Error::Validation(reason));
        }

        // CACHE_LOOKUP: the dominant low-latency path
        let hash = item.content_hash();
        if let Some(hit) = self.cache.get(&hash) {
            self.metrics.record_cache_hit();
            debug!(%hash, "verdict served from cache");
            return Ok(hit);
        }

        let policy = self.policy.load();
        let item = Arc::new(item);

        // SCORING: concurrent fan-out with a join barrier
        let (scores, degraded) = self.score_item(&item).await;

        // AGGREGATING: highest-confidence violating rule wins
        let mut result = aggregate(&policy, &item, &scores);
        result.degraded = degraded;

        // RATE_CHECK: throttled enforcement degrades to logging, the
        // verdict itself is never dropped
        if result.is_violation {
            if let Some(action) = result.action {
                if action.is_active() && !self.limiter.allow(&item.source_id) {
                    debug!(source = %item.source_id, "rate budget exhausted, action downgraded");
                    result.action = Some(RuleAction::Log);
                }
            }
        }

        result.latency = started.elapsed();
        if result.degraded {
            self.metrics.record_degraded();
        }
        if result.is_violation {
            if let Some(kind) = result.kind {
                self.metrics.record_violation(kind.as_str());
            }
            info!(
                source = %item.source_id,
                kind = result.kind.map(|k| k.as_str()).unwrap_or("none"),
                confidence = result.confidence,
                "violation detected"
            );
        }

        self.threats.track(&item);
        self.cache.put(hash, result.clone());
        Ok(result)
    }

    /// Fan scoring units out across the worker pool and merge the
    /// settled results.
    async fn score_item(&self, item: &Arc<ContentItem>) -> (ScoreVector, bool) {
        let mut degraded = false;
        let mut units: Vec<(Arc<dyn Scorer>, Arc<ContentItem>)> = Vec::new();

        for scorer in self.registry.for_modality(item.modality) {
            units.push((Arc::clone(scorer), Arc::clone(item)));
        }

        // Video is scored frame-by-frame through the image scorers
        if item.modality == Modality::Video {
            if let Some(data) = item.binary_body() {
                match self.sampler.sample(data) {
                    Ok(frames) => {
                        for frame in frames {
                            let frame_item = Arc::new(ContentItem::image(
                                item.source_id.clone(),
                                item.chat_id.clone(),
                                frame,
                            ));
                            for scorer in self.registry.for_modality(Modality::Image) {
                                units.push((Arc::clone(scorer), Arc::clone(&frame_item)));
                            }
                        }
                    }
                    Err(err) => {
                        debug!(%err, "frame sampling produced nothing scoreable");
                        degraded = true;
                    }
                }
            }
        }

        let mut merged = ScoreVector::new();
        if units.is_empty() {
            return (merged, degraded);
        }

        let handles: Vec<_> = units
            .into_iter()
            .map(|(scorer, item)| {
                let pool = Arc::clone(&self.pool);
                tokio::spawn(async move {
                    let _permit = match pool.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return ScorerOutcome::Failed(scorer.kinds().to_vec()),
                    };
                    match timeout(scorer.timeout(), scorer.score(&item)).await {
                        Ok(Ok(scores)) => ScorerOutcome::Scored(scores),
                        Ok(Err(err)) => {
                            warn!(scorer = scorer.name(), %err, "scorer fault");
                            ScorerOutcome::Failed(scorer.kinds().to_vec())
                        }
                        Err(_) => {
                            warn!(
                                scorer = scorer.name(),
                                budget = ?scorer.timeout(),
                                "scorer timed out"
                            );
                            ScorerOutcome::Failed(scorer.kinds().to_vec())
                        }
                    }
                })
            })
            .collect();

        // Join barrier: aggregation never sees a nondeterministic subset
        for joined in join_all(handles).await {
            match joined {
                Ok(ScorerOutcome::Scored(scores)) => merged.merge(scores),
                Ok(ScorerOutcome::Failed(kinds)) => {
                    degraded = true;
                    for kind in kinds {
                        merged.mark_unknown(kind);
                    }
                }
                Err(_) => degraded = true,
            }
        }

        (merged, degraded)
    }

    /// Atomically activate a replacement policy
    pub fn install_policy(&self, policy: Policy) {
        self.policy.swap(policy);
    }

    /// Parse and activate a sentence-form policy document, all-or-nothing
    pub fn install_sentences(&self, doc: &str) -> std::result::Result<(), Vec<ParseError>> {
        let policy = Policy::from_sentences(doc)?;
        self.policy.swap(policy);
        Ok(())
    }

    /// Compile and activate structured rule records, all-or-nothing
    pub fn install_specs(&self, specs: &[RuleSpec]) -> std::result::Result<(), Vec<ParseError>> {
        let policy = Policy::from_specs(specs)?;
        self.policy.swap(policy);
        Ok(())
    }

    /// Snapshot of the active policy
    pub fn active_policy(&self) -> Arc<Policy> {
        self.policy.load()
    }

    /// Seal and store the platform credential. Only the sealed form is
    /// retained.
    pub fn store_credential(&self, plaintext: &str) -> Result<()> {
        let secrets = self
            .secrets
            .as_ref()
            .ok_or_else(|| Error::config("no secret manager configured"))?;
        let sealed = secrets.seal(plaintext)?;
        *self.credential.lock() = Some(sealed);
        info!("platform credential sealed");
        Ok(())
    }

    /// Unseal the stored credential for an outbound platform call.
    pub fn credential(&self) -> Result<SecretString> {
        let secrets = self
            .secrets
            .as_ref()
            .ok_or_else(|| Error::config("no secret manager configured"))?;
        let sealed = self.credential.lock();
        let sealed = sealed
            .as_ref()
            .ok_or_else(|| Error::config("no credential stored"))?;
        secrets.unseal(sealed)
    }

    /// Confine a payload-derived file name to the scratch directory
    pub fn scratch_path(&self, name: &str) -> Result<PathBuf> {
        self.validator
            .sanitize_path(name, &self.config.scratch_dir)
            .map_err(Error::Validation)
    }

    /// Coordinated-threat patterns observed in one chat
    pub fn threat_patterns(&self, chat_id: &str) -> Vec<ThreatPattern> {
        self.threats.detect(chat_id)
    }

    /// Health surface: a pure read, no side effects
    pub fn health(&self) -> Health {
        let snapshot = self.metrics.snapshot();
        let rate = snapshot.degraded_rate();
        Health {
            status: if rate > 0.5 { "degraded" } else { "ok" },
            cache_size: self.cache.len(),
            degraded_request_rate: rate,
        }
    }
}

/// Compare the score vector (and any direct pattern or length matches)
/// against the active policy.
///
/// The highest-confidence rule at or above its threshold wins; equal
/// confidences keep the earlier rule, so declaration order is the
/// tie-break. Unknown scores never violate.
fn aggregate(policy: &Policy, item: &ContentItem, scores: &ScoreVector) -> ModerationResult {
    let text = item.text_body();
    let mut winner: Option<(&Rule, f32)> = None;

    for rule in policy.rules() {
        let direct = text.and_then(|t| rule.match_text(t));
        let scored = scores.get(rule.kind);

        let confidence = match (direct, scored) {
            (Some(d), Some(s)) => d.max(s),
            (Some(d), None) => d,
            (None, Some(s)) => s,
            (None, None) => continue,
        };

        if confidence < rule.threshold {
            continue;
        }
        if winner.map_or(true, |(_, best)| confidence > best) {
            winner = Some((rule, confidence));
        }
    }

    match winner {
        Some((rule, confidence)) => {
            ModerationResult::violation(rule.kind, confidence, rule.action)
                .with_reason(rule.reason.clone())
        }
        None => ModerationResult::clean(),
    }
}
