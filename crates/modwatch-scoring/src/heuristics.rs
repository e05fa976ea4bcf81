//! Lightweight text heuristics

use async_trait::async_trait;
use modwatch_core::{ContentItem, Modality, Result, RuleKind, ScoreVector};

use crate::scorer::Scorer;

/// Minimum text length before the caps heuristic applies; short shouts
/// like "OK!" are noise, not violations.
const MIN_CAPS_LEN: usize = 10;

/// Scores the ratio of capital letters in a text body.
///
/// The ratio itself is the confidence, so a policy threshold of 0.7
/// fires on more than 70% caps.
pub struct CapsScorer;

#[async_trait]
impl Scorer for CapsScorer {
    async fn score(&self, item: &ContentItem) -> Result<ScoreVector> {
        let mut scores = ScoreVector::new();
        let Some(text) = item.text_body() else {
            return Ok(scores);
        };

        let ratio = caps_ratio(text);
        scores.record(RuleKind::Caps, ratio);
        Ok(scores)
    }

    fn name(&self) -> &str {
        "caps"
    }

    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn kinds(&self) -> &[RuleKind] {
        &[RuleKind::Caps]
    }
}

/// Fraction of characters that are uppercase, zero for short texts
pub fn caps_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total < MIN_CAPS_LEN {
        return 0.0;
    }
    let caps = text.chars().filter(|c| c.is_uppercase()).count();
    caps as f32 / total as f32
}

/// Whether more than half the words are the same word repeated.
///
/// A common spam indicator; the spam keyword scorer adds a confidence
/// boost when it holds.
pub fn is_repetitive(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 3 {
        return false;
    }

    let mut counts = std::collections::HashMap::new();
    for word in &words {
        *counts.entry(word.to_lowercase()).or_insert(0usize) += 1;
    }

    let max_count = counts.values().copied().max().unwrap_or(0);
    max_count * 2 > words.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shouting_scores_high() {
        let item = ContentItem::text("u1", "c1", "STOP SHOUTING AT EVERYONE");
        let scores = CapsScorer.score(&item).await.unwrap();
        assert!(scores.get(RuleKind::Caps).unwrap() > 0.7);
    }

    #[tokio::test]
    async fn normal_text_scores_low() {
        let item = ContentItem::text("u1", "c1", "just a normal message here");
        let scores = CapsScorer.score(&item).await.unwrap();
        assert!(scores.get(RuleKind::Caps).unwrap() < 0.1);
    }

    #[test]
    fn short_text_is_exempt() {
        assert_eq!(caps_ratio("HI!!!"), 0.0);
    }

    #[test]
    fn repetition_detection() {
        assert!(is_repetitive("buy buy buy buy now"));
        assert!(!is_repetitive("a perfectly varied sentence here"));
        assert!(!is_repetitive("too short"));
    }
}
