//! Keyword-indicator scorers
//!
//! One scorer instance per rule kind, built on an Aho-Corasick matcher.
//! Confidence starts at 0.6 for any hit and grows with the fraction of
//! the indicator list present, capped at 0.95.

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use modwatch_core::{ContentItem, Error, Modality, Result, RuleKind, ScoreVector};
use std::collections::HashSet;

use crate::heuristics::is_repetitive;
use crate::scorer::Scorer;

const BASE_CONFIDENCE: f32 = 0.6;
const RATIO_WEIGHT: f32 = 0.35;
const CONFIDENCE_CAP: f32 = 0.95;
const REPETITION_BOOST: f32 = 0.3;

/// Spam indicators
pub const SPAM_KEYWORDS: &[&str] = &[
    "buy now",
    "limited time",
    "click here",
    "free money",
    "earn $$$",
    "make money fast",
    "work from home",
    "get rich quick",
    "no experience",
    "guaranteed income",
    "join now",
    "act now",
    "special offer",
];

/// Harassment indicators
pub const HARASSMENT_KEYWORDS: &[&str] = &[
    "idiot",
    "stupid",
    "loser",
    "shut up",
    "kill yourself",
    "hate you",
    "worthless",
    "pathetic",
    "disgusting",
    "go die",
];

/// Adult-content indicators
pub const NSFW_KEYWORDS: &[&str] = &[
    "xxx",
    "porn",
    "naked",
    "nude",
    "sex chat",
    "adult content",
    "18+",
    "nsfw",
    "explicit",
];

/// Hate-speech indicators
pub const HATE_KEYWORDS: &[&str] = &["terrorist", "nazi", "fascist"];

/// Violence indicators
pub const VIOLENCE_KEYWORDS: &[&str] = &["blood", "gore", "weapon", "massacre", "fight"];

/// Indicator-list scorer for a single rule kind
pub struct KeywordScorer {
    name: String,
    kind: [RuleKind; 1],
    matcher: AhoCorasick,
    keyword_count: usize,
    repetition_boost: bool,
}

impl KeywordScorer {
    /// Build a scorer over an indicator list
    pub fn new(kind: RuleKind, keywords: &[&str]) -> Result<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(keywords)
            .map_err(|e| Error::scorer_fault(kind.as_str(), format!("bad keyword list: {e}")))?;

        Ok(Self {
            name: format!("keywords:{}", kind.as_str()),
            kind: [kind],
            matcher,
            keyword_count: keywords.len(),
            repetition_boost: false,
        })
    }

    /// Add a confidence boost for repetitive text (spam indicator)
    pub fn with_repetition_boost(mut self) -> Self {
        self.repetition_boost = true;
        self
    }

    pub fn spam() -> Result<Self> {
        Ok(Self::new(RuleKind::Spam, SPAM_KEYWORDS)?.with_repetition_boost())
    }

    pub fn harassment() -> Result<Self> {
        Self::new(RuleKind::Harassment, HARASSMENT_KEYWORDS)
    }

    pub fn nsfw() -> Result<Self> {
        Self::new(RuleKind::Nsfw, NSFW_KEYWORDS)
    }

    pub fn hate_speech() -> Result<Self> {
        Self::new(RuleKind::HateSpeech, HATE_KEYWORDS)
    }

    pub fn violence() -> Result<Self> {
        Self::new(RuleKind::Violence, VIOLENCE_KEYWORDS)
    }
}

#[async_trait]
impl Scorer for KeywordScorer {
    async fn score(&self, item: &ContentItem) -> Result<ScoreVector> {
        let mut scores = ScoreVector::new();
        let Some(text) = item.text_body() else {
            return Ok(scores);
        };

        let distinct: HashSet<usize> = self
            .matcher
            .find_iter(text)
            .map(|m| m.pattern().as_usize())
            .collect();

        let mut confidence = if distinct.is_empty() {
            0.0
        } else {
            let ratio = distinct.len() as f32 / self.keyword_count as f32;
            (BASE_CONFIDENCE + ratio * RATIO_WEIGHT).min(CONFIDENCE_CAP)
        };

        if confidence > 0.0 && self.repetition_boost && is_repetitive(text) {
            confidence = (confidence + REPETITION_BOOST).min(CONFIDENCE_CAP);
        }

        scores.record(self.kind[0], confidence);
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn kinds(&self) -> &[RuleKind] {
        &self.kind
    }
}
