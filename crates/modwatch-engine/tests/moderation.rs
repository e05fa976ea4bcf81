//! End-to-end engine behavior with mock scorers

use async_trait::async_trait;
use modwatch_core::{ContentItem, Error, Modality, Result, RuleAction, RuleKind, ScoreVector};
use modwatch_engine::{EngineConfig, Moderator, SecretManager};
use modwatch_policy::{Policy, Rule};
use modwatch_scoring::{Scorer, ScorerRegistry};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A configurable mock scorer for engine tests
struct MockScorer {
    name: String,
    kind: [RuleKind; 1],
    modality: Modality,
    score: f32,
    simulated_latency: Option<Duration>,
    budget: Duration,
    call_count: AtomicU32,
}

impl MockScorer {
    fn new(kind: RuleKind, score: f32) -> Self {
        Self {
            name: format!("mock:{}", kind.as_str()),
            kind: [kind],
            modality: Modality::Text,
            score,
            simulated_latency: None,
            budget: Duration::from_millis(500),
            call_count: AtomicU32::new(0),
        }
    }

    fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = modality;
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = Some(latency);
        self
    }

    fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn score(&self, _item: &ContentItem) -> Result<ScoreVector> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.simulated_latency {
            tokio::time::sleep(latency).await;
        }
        let mut scores = ScoreVector::new();
        scores.record(self.kind[0], self.score);
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn modality(&self) -> Modality {
        self.modality
    }

    fn kinds(&self) -> &[RuleKind] {
        &self.kind
    }

    fn timeout(&self) -> Duration {
        self.budget
    }
}

/// A scorer that always faults
struct FailingScorer {
    kind: [RuleKind; 1],
    modality: Modality,
}

#[async_trait]
impl Scorer for FailingScorer {
    async fn score(&self, _item: &ContentItem) -> Result<ScoreVector> {
        Err(Error::scorer_fault("failing", "synthetic fault"))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn modality(&self) -> Modality {
        self.modality
    }

    fn kinds(&self) -> &[RuleKind] {
        &self.kind
    }
}

fn single_rule_policy(kind: RuleKind, threshold: f32, action: RuleAction) -> Policy {
    Policy::new(vec![Rule::new(kind, threshold, action).unwrap()]).unwrap()
}

fn engine_with(
    policy: Policy,
    scorers: Vec<Arc<dyn Scorer>>,
    config: EngineConfig,
) -> Moderator {
    let mut registry = ScorerRegistry::new();
    for scorer in scorers {
        registry.register(scorer);
    }
    Moderator::new(config, policy, registry)
}

/// Synthetic MJPEG stream with `count` frames
fn mjpeg_stream(count: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..count {
        data.extend_from_slice(&[0xff, 0xd8]);
        data.extend_from_slice(&[i as u8; 4]);
        data.extend_from_slice(&[0xff, 0xd9]);
    }
    data
}

#[tokio::test]
async fn repeated_payloads_hit_the_cache_bit_identically() {
    let engine = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        vec![Arc::new(MockScorer::new(RuleKind::Spam, 0.9))],
        EngineConfig::default(),
    );

    let first = engine
        .moderate(ContentItem::text("u1", "c1", "the same payload"))
        .await
        .unwrap();
    let second = engine
        .moderate(ContentItem::text("u2", "c1", "the same payload"))
        .await
        .unwrap();

    assert!(!first.cached);
    assert!(second.cached);

    let mut expected = first.clone();
    expected.cached = true;
    assert_eq!(second, expected);
}

#[tokio::test]
async fn oversized_text_rejected_without_scheduling_any_scorer() {
    let scorer = Arc::new(MockScorer::new(RuleKind::Spam, 0.9));
    let engine = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        vec![scorer.clone()],
        EngineConfig::default(),
    );

    let oversized = ContentItem::text("u1", "c1", "a".repeat(4 * 1024 + 1));
    let err = engine.moderate(oversized).await.unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(scorer.call_count(), 0);
}

#[tokio::test]
async fn oversized_media_rejected_without_scheduling_any_scorer() {
    let image_scorer = Arc::new(
        MockScorer::new(RuleKind::Nsfw, 0.9).with_modality(Modality::Image),
    );
    let engine = engine_with(
        single_rule_policy(RuleKind::Nsfw, 0.8, RuleAction::Delete),
        vec![image_scorer.clone()],
        EngineConfig::default(),
    );

    let image = ContentItem::image("u1", "c1", vec![0u8; 10 * 1024 * 1024 + 1]);
    assert!(engine.moderate(image).await.is_err());

    let video = ContentItem::video("u1", "c1", vec![0u8; 50 * 1024 * 1024 + 1]);
    assert!(engine.moderate(video).await.is_err());

    assert_eq!(image_scorer.call_count(), 0);
}

#[tokio::test]
async fn evicted_entries_are_recomputed() {
    let config = EngineConfig {
        cache_capacity: 2,
        ..EngineConfig::default()
    };
    let engine = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        vec![Arc::new(MockScorer::new(RuleKind::Spam, 0.1))],
        config,
    );

    engine.moderate(ContentItem::text("u1", "c1", "first")).await.unwrap();
    engine.moderate(ContentItem::text("u1", "c1", "second")).await.unwrap();
    // Capacity 2: this evicts "first"
    engine.moderate(ContentItem::text("u1", "c1", "third")).await.unwrap();

    let again = engine
        .moderate(ContentItem::text("u1", "c1", "first"))
        .await
        .unwrap();
    assert!(!again.cached);

    let still_cached = engine
        .moderate(ContentItem::text("u1", "c1", "third"))
        .await
        .unwrap();
    assert!(still_cached.cached);
}

#[tokio::test]
async fn threshold_separates_violation_from_clean() {
    let scorers = || -> Vec<Arc<dyn Scorer>> {
        vec![Arc::new(MockScorer::new(RuleKind::Spam, 0.9))]
    };

    let strict = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        scorers(),
        EngineConfig::default(),
    );
    let verdict = strict
        .moderate(ContentItem::text("u1", "c1", "questionable"))
        .await
        .unwrap();
    assert!(verdict.is_violation);
    assert_eq!(verdict.kind, Some(RuleKind::Spam));
    assert_eq!(verdict.action, Some(RuleAction::Delete));
    assert!((verdict.confidence - 0.9).abs() < f32::EPSILON);

    let lenient = engine_with(
        single_rule_policy(RuleKind::Spam, 0.95, RuleAction::Delete),
        scorers(),
        EngineConfig::default(),
    );
    let verdict = lenient
        .moderate(ContentItem::text("u1", "c1", "questionable"))
        .await
        .unwrap();
    assert!(!verdict.is_violation);
}

#[tokio::test(start_paused = true)]
async fn timed_out_scorer_degrades_but_keeps_the_violation() {
    let slow = Arc::new(
        MockScorer::new(RuleKind::Nsfw, 0.99)
            .with_latency(Duration::from_secs(5))
            .with_budget(Duration::from_millis(50)),
    );
    let confident = Arc::new(MockScorer::new(RuleKind::Spam, 0.9));

    let policy = Policy::new(vec![
        Rule::new(RuleKind::Nsfw, 0.5, RuleAction::Delete).unwrap(),
        Rule::new(RuleKind::Spam, 0.8, RuleAction::Delete).unwrap(),
    ])
    .unwrap();

    let engine = engine_with(
        policy,
        vec![slow, confident],
        EngineConfig::default(),
    );
    let verdict = engine
        .moderate(ContentItem::text("u1", "c1", "partially scored"))
        .await
        .unwrap();

    assert!(verdict.is_violation);
    assert_eq!(verdict.kind, Some(RuleKind::Spam));
    assert!(verdict.degraded);
}

#[tokio::test]
async fn faulting_scorer_degrades_without_violating() {
    let engine = engine_with(
        single_rule_policy(RuleKind::Nsfw, 0.5, RuleAction::Delete),
        vec![Arc::new(FailingScorer {
            kind: [RuleKind::Nsfw],
            modality: Modality::Text,
        })],
        EngineConfig::default(),
    );

    let verdict = engine
        .moderate(ContentItem::text("u1", "c1", "whatever"))
        .await
        .unwrap();
    assert!(!verdict.is_violation);
    assert!(verdict.degraded);
}

#[tokio::test]
async fn video_frames_are_scored_through_image_scorers() {
    let frame_scorer = Arc::new(
        MockScorer::new(RuleKind::Nsfw, 0.9).with_modality(Modality::Image),
    );
    let engine = engine_with(
        single_rule_policy(RuleKind::Nsfw, 0.8, RuleAction::Delete),
        vec![frame_scorer.clone()],
        EngineConfig::default(),
    );

    let verdict = engine
        .moderate(ContentItem::video("u1", "c1", mjpeg_stream(20)))
        .await
        .unwrap();

    assert!(verdict.is_violation);
    assert_eq!(verdict.kind, Some(RuleKind::Nsfw));
    // Frame budget bounds the fan-out regardless of video length
    assert_eq!(frame_scorer.call_count(), 8);
}

#[tokio::test]
async fn unusable_video_is_clean_but_degraded() {
    let engine = engine_with(
        single_rule_policy(RuleKind::Nsfw, 0.8, RuleAction::Delete),
        vec![Arc::new(
            MockScorer::new(RuleKind::Nsfw, 0.9).with_modality(Modality::Image),
        )],
        EngineConfig::default(),
    );

    let verdict = engine
        .moderate(ContentItem::video("u1", "c1", b"not a video at all".to_vec()))
        .await
        .unwrap();

    assert!(!verdict.is_violation);
    assert!(verdict.degraded);
}

#[tokio::test]
async fn exhausted_rate_budget_downgrades_the_action() {
    let config = EngineConfig {
        burst_size: 1,
        messages_per_second: 0.001,
        ..EngineConfig::default()
    };
    let engine = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        vec![Arc::new(MockScorer::new(RuleKind::Spam, 0.9))],
        config,
    );

    let first = engine
        .moderate(ContentItem::text("u1", "c1", "spammy one"))
        .await
        .unwrap();
    assert_eq!(first.action, Some(RuleAction::Delete));

    let second = engine
        .moderate(ContentItem::text("u1", "c1", "spammy two"))
        .await
        .unwrap();
    assert!(second.is_violation, "the verdict itself is preserved");
    assert_eq!(second.action, Some(RuleAction::Log));
}

#[tokio::test]
async fn health_reflects_traffic() {
    let engine = engine_with(
        single_rule_policy(RuleKind::Nsfw, 0.5, RuleAction::Delete),
        vec![Arc::new(FailingScorer {
            kind: [RuleKind::Nsfw],
            modality: Modality::Text,
        })],
        EngineConfig::default(),
    );

    engine
        .moderate(ContentItem::text("u1", "c1", "one"))
        .await
        .unwrap();

    let health = engine.health();
    assert_eq!(health.cache_size, 1);
    assert!(health.degraded_request_rate > 0.99);
    assert_eq!(health.status, "degraded");
}

#[tokio::test]
async fn policy_swap_applies_to_new_requests() {
    let engine = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        vec![Arc::new(MockScorer::new(RuleKind::Spam, 0.9))],
        EngineConfig::default(),
    );

    let before = engine
        .moderate(ContentItem::text("u1", "c1", "first payload"))
        .await
        .unwrap();
    assert!(before.is_violation);

    engine.install_specs(&[modwatch_policy::RuleSpec {
        kind: RuleKind::Spam,
        threshold: 0.95,
        action: RuleAction::Delete,
        pattern: None,
        max_length: None,
        reason: None,
    }])
    .unwrap();

    let after = engine
        .moderate(ContentItem::text("u1", "c1", "second payload"))
        .await
        .unwrap();
    assert!(!after.is_violation);
}

#[tokio::test]
async fn sentence_policy_flows_end_to_end() {
    let engine = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        vec![Arc::new(MockScorer::new(RuleKind::Spam, 0.0))],
        EngineConfig::default(),
    );
    engine
        .install_sentences("don't allow 'free money' messages")
        .unwrap();

    let verdict = engine
        .moderate(ContentItem::text("u1", "c1", "FREE MONEY for everyone"))
        .await
        .unwrap();
    assert!(verdict.is_violation);
    assert_eq!(verdict.kind, Some(RuleKind::Custom));
    assert_eq!(verdict.action, Some(RuleAction::Delete));

    let clean = engine
        .moderate(ContentItem::text("u1", "c1", "an unremarkable message"))
        .await
        .unwrap();
    assert!(!clean.is_violation);
}

#[tokio::test]
async fn credential_round_trip_through_the_engine() {
    let engine = engine_with(
        single_rule_policy(RuleKind::Spam, 0.8, RuleAction::Delete),
        vec![],
        EngineConfig::default(),
    )
    .with_secret_manager(SecretManager::from_key(&[9u8; 32]));

    engine.store_credential("123456789:platform-token").unwrap();
    let secret = engine.credential().unwrap();
    assert_eq!(secret.expose(), "123456789:platform-token");
    assert_eq!(format!("{secret}"), "[REDACTED]");
}
