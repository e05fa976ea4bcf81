//! Core types for the moderation engine

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::hash::ContentHash;

/// Content modality of an inbound item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Video,
}

impl Modality {
    /// Lowercase name, used in log fields and rejection reasons
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Category a rule scores against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Spam,
    Harassment,
    Nsfw,
    HateSpeech,
    Caps,
    Violence,
    Custom,
}

impl RuleKind {
    /// All fixed (non-custom) kinds, in a stable order
    pub const FIXED: [RuleKind; 6] = [
        RuleKind::Spam,
        RuleKind::Harassment,
        RuleKind::Nsfw,
        RuleKind::HateSpeech,
        RuleKind::Caps,
        RuleKind::Violence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Harassment => "harassment",
            Self::Nsfw => "nsfw",
            Self::HateSpeech => "hate_speech",
            Self::Caps => "caps",
            Self::Violence => "violence",
            Self::Custom => "custom",
        }
    }
}

/// Action taken when a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Delete,
    Warn,
    Log,
    Alert,
}

impl RuleAction {
    /// Whether this action touches the platform (and is therefore
    /// subject to the per-source rate budget). `Log` is always free.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Log)
    }
}

/// Raw payload of a content item
#[derive(Debug, Clone)]
pub enum ContentPayload {
    Text(String),
    Binary(Bytes),
}

impl ContentPayload {
    /// Payload length in bytes
    pub fn len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes view, for hashing
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b.as_ref(),
        }
    }
}

/// One inbound message or media item, as delivered by the platform client.
///
/// The payload lives only for the duration of the `moderate` call; the
/// engine never persists it.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub modality: Modality,
    pub payload: ContentPayload,
    /// Stable identifier of the sender (rate-limit key)
    pub source_id: String,
    /// Conversation the item arrived in
    pub chat_id: String,
}

impl ContentItem {
    /// Create a text item
    pub fn text(
        source_id: impl Into<String>,
        chat_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            modality: Modality::Text,
            payload: ContentPayload::Text(body.into()),
            source_id: source_id.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Create a text item from raw bytes.
    ///
    /// Invalid UTF-8 is admitted by substitution, never by fault.
    pub fn text_lossy(
        source_id: impl Into<String>,
        chat_id: impl Into<String>,
        body: &[u8],
    ) -> Self {
        Self::text(source_id, chat_id, String::from_utf8_lossy(body).into_owned())
    }

    /// Create an image item
    pub fn image(
        source_id: impl Into<String>,
        chat_id: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            modality: Modality::Image,
            payload: ContentPayload::Binary(data.into()),
            source_id: source_id.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Create a video item
    pub fn video(
        source_id: impl Into<String>,
        chat_id: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            modality: Modality::Video,
            payload: ContentPayload::Binary(data.into()),
            source_id: source_id.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Text body, if this is a text item
    pub fn text_body(&self) -> Option<&str> {
        match &self.payload {
            ContentPayload::Text(s) => Some(s.as_str()),
            ContentPayload::Binary(_) => None,
        }
    }

    /// Binary payload, if this is a media item
    pub fn binary_body(&self) -> Option<&Bytes> {
        match &self.payload {
            ContentPayload::Binary(b) => Some(b),
            ContentPayload::Text(_) => None,
        }
    }

    /// Cache key for this item's payload
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(self.payload.as_bytes())
    }
}

/// Per-kind confidences produced by the scorer fan-out for one item.
///
/// Owned by the orchestration call that produced it. Kinds whose scorer
/// timed out or faulted are tracked as unknown; unknown never violates.
#[derive(Debug, Clone, Default)]
pub struct ScoreVector {
    scores: HashMap<RuleKind, f32>,
    unknown: HashSet<RuleKind>,
}

impl ScoreVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confidence for a kind, keeping the maximum seen so far.
    /// Values are clamped into `[0, 1]`.
    pub fn record(&mut self, kind: RuleKind, confidence: f32) {
        let confidence = confidence.clamp(0.0, 1.0);
        let entry = self.scores.entry(kind).or_insert(0.0);
        if confidence > *entry {
            *entry = confidence;
        }
    }

    /// Mark a kind as unknown (its scorer failed or timed out).
    /// A later known score for the same kind still counts.
    pub fn mark_unknown(&mut self, kind: RuleKind) {
        self.unknown.insert(kind);
    }

    /// Known confidence for a kind
    pub fn get(&self, kind: RuleKind) -> Option<f32> {
        self.scores.get(&kind).copied()
    }

    /// Whether any scorer for this kind failed
    pub fn is_unknown(&self, kind: RuleKind) -> bool {
        self.unknown.contains(&kind)
    }

    /// Merge another vector into this one (max per kind)
    pub fn merge(&mut self, other: ScoreVector) {
        for (kind, confidence) in other.scores {
            self.record(kind, confidence);
        }
        self.unknown.extend(other.unknown);
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty() && self.unknown.is_empty()
    }
}

/// Verdict for one content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub is_violation: bool,
    /// Winning rule kind, when a rule fired
    pub kind: Option<RuleKind>,
    pub confidence: f32,
    /// Action of the winning rule (possibly downgraded to `Log` by the
    /// rate limiter)
    pub action: Option<RuleAction>,
    pub reason: Option<String>,
    /// Served from the verdict cache
    pub cached: bool,
    /// One or more scorers failed or timed out while producing this
    pub degraded: bool,
    pub latency: Duration,
}

impl ModerationResult {
    /// A clean (non-violating) verdict
    pub fn clean() -> Self {
        Self {
            is_violation: false,
            kind: None,
            confidence: 0.0,
            action: None,
            reason: None,
            cached: false,
            degraded: false,
            latency: Duration::ZERO,
        }
    }

    /// A violating verdict for the given rule kind
    pub fn violation(kind: RuleKind, confidence: f32, action: RuleAction) -> Self {
        Self {
            is_violation: true,
            kind: Some(kind),
            confidence,
            action: Some(action),
            reason: None,
            cached: false,
            degraded: false,
            latency: Duration::ZERO,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_vector_keeps_maximum() {
        let mut scores = ScoreVector::new();
        scores.record(RuleKind::Spam, 0.4);
        scores.record(RuleKind::Spam, 0.9);
        scores.record(RuleKind::Spam, 0.6);
        assert_eq!(scores.get(RuleKind::Spam), Some(0.9));
    }

    #[test]
    fn score_vector_clamps_out_of_range() {
        let mut scores = ScoreVector::new();
        scores.record(RuleKind::Nsfw, 1.7);
        assert_eq!(scores.get(RuleKind::Nsfw), Some(1.0));
    }

    #[test]
    fn merge_combines_scores_and_unknowns() {
        let mut a = ScoreVector::new();
        a.record(RuleKind::Spam, 0.5);

        let mut b = ScoreVector::new();
        b.record(RuleKind::Spam, 0.8);
        b.mark_unknown(RuleKind::Nsfw);

        a.merge(b);
        assert_eq!(a.get(RuleKind::Spam), Some(0.8));
        assert!(a.is_unknown(RuleKind::Nsfw));
    }

    #[test]
    fn lossy_text_never_faults() {
        let item = ContentItem::text_lossy("u1", "c1", &[0xff, 0xfe, b'h', b'i']);
        assert!(item.text_body().unwrap().ends_with("hi"));
    }

    #[test]
    fn hash_ignores_source_and_chat() {
        let a = ContentItem::text("u1", "c1", "same body");
        let b = ContentItem::text("u2", "c2", "same body");
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn log_action_is_not_active() {
        assert!(RuleAction::Delete.is_active());
        assert!(RuleAction::Warn.is_active());
        assert!(RuleAction::Alert.is_active());
        assert!(!RuleAction::Log.is_active());
    }
}
