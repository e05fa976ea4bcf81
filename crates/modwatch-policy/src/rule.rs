//! Rule definitions and structured rule records

use modwatch_core::{RuleAction, RuleKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::safety;

/// Errors produced while authoring a policy
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// No recognizable rule pattern matched the sentence
    #[error("no recognizable rule pattern in: '{0}'")]
    Unrecognized(String),

    /// Pattern failed the ReDoS safety check
    #[error("unsafe pattern '{pattern}': {reason}")]
    UnsafePattern { pattern: String, reason: String },

    /// Pattern passed the safety check but did not compile
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Threshold outside the unit interval
    #[error("threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),

    /// Two non-custom rules share a kind
    #[error("duplicate rule kind '{0}' in policy")]
    DuplicateKind(&'static str),
}

impl From<ParseError> for modwatch_core::Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnsafePattern { ref pattern, .. } => {
                modwatch_core::Error::UnsafePattern(pattern.clone())
            }
            other => modwatch_core::Error::Policy(other.to_string()),
        }
    }
}

/// A single compiled moderation rule.
///
/// Immutable once built: the pattern has passed the safety check, the
/// threshold is in range, and nothing mutates a rule after policy
/// activation.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    /// Minimum confidence at which this rule fires
    pub threshold: f32,
    pub action: RuleAction,
    pattern: Option<Regex>,
    pattern_source: Option<String>,
    /// Maximum text length, for length-limit rules
    pub max_length: Option<usize>,
    /// Human-readable explanation attached to violations
    pub reason: String,
    /// Confidence reported when the rule matches content directly
    pub confidence: f32,
}

impl Rule {
    /// Create a rule with no pattern. Fails if the threshold is out of range.
    pub fn new(kind: RuleKind, threshold: f32, action: RuleAction) -> Result<Self, ParseError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ParseError::InvalidThreshold(threshold));
        }
        Ok(Self {
            kind,
            threshold,
            action,
            pattern: None,
            pattern_source: None,
            max_length: None,
            reason: format!("{} violation", kind.as_str()),
            confidence: 0.9,
        })
    }

    /// Attach a pattern source. The pattern is safety-checked and compiled;
    /// unsafe or invalid sources fail rule admission.
    pub fn with_pattern(mut self, source: &str) -> Result<Self, ParseError> {
        let compiled = safety::compile_pattern(source)?;
        self.pattern = Some(compiled);
        self.pattern_source = Some(source.to_string());
        Ok(self)
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Compiled pattern, if one is attached
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Original pattern source, for export
    pub fn pattern_source(&self) -> Option<&str> {
        self.pattern_source.as_deref()
    }

    /// Confidence of a direct match against a text body, if any.
    ///
    /// Pattern and length constraints are evaluated by the rule itself;
    /// kinds without constraints rely on the scorer fan-out instead.
    pub fn match_text(&self, text: &str) -> Option<f32> {
        if let Some(re) = &self.pattern {
            if re.is_match(text) {
                return Some(self.confidence);
            }
        }
        if let Some(max) = self.max_length {
            if text.chars().count() > max {
                return Some(self.confidence);
            }
        }
        None
    }
}

/// Default firing threshold per kind, used by the sentence parser.
///
/// Values mirror the gates the keyword scorers were tuned against.
pub fn default_threshold(kind: RuleKind) -> f32 {
    match kind {
        RuleKind::Spam | RuleKind::Harassment => 0.6,
        RuleKind::Nsfw | RuleKind::HateSpeech | RuleKind::Violence => 0.8,
        RuleKind::Caps => 0.7,
        RuleKind::Custom => 0.9,
    }
}

/// Structured rule record, the serialized form of a rule.
///
/// Accepted at the policy-load surface alongside sentence documents, and
/// produced by policy export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub kind: RuleKind,
    pub threshold: f32,
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RuleSpec {
    /// Compile this record into an immutable rule
    pub fn compile(&self) -> Result<Rule, ParseError> {
        let mut rule = Rule::new(self.kind, self.threshold, self.action)?;
        if let Some(source) = &self.pattern {
            rule = rule.with_pattern(source)?;
        }
        if let Some(max) = self.max_length {
            rule = rule.with_max_length(max);
        }
        if let Some(reason) = &self.reason {
            rule = rule.with_reason(reason.clone());
        }
        Ok(rule)
    }
}

impl From<&Rule> for RuleSpec {
    fn from(rule: &Rule) -> Self {
        Self {
            kind: rule.kind,
            threshold: rule.threshold,
            action: rule.action,
            pattern: rule.pattern_source().map(str::to_string),
            max_length: rule.max_length,
            reason: Some(rule.reason.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_must_be_in_unit_interval() {
        assert!(Rule::new(RuleKind::Spam, 1.2, RuleAction::Delete).is_err());
        assert!(Rule::new(RuleKind::Spam, -0.1, RuleAction::Delete).is_err());
        assert!(Rule::new(RuleKind::Spam, 0.0, RuleAction::Delete).is_ok());
        assert!(Rule::new(RuleKind::Spam, 1.0, RuleAction::Delete).is_ok());
    }

    #[test]
    fn unsafe_pattern_fails_admission() {
        let err = Rule::new(RuleKind::Custom, 0.9, RuleAction::Delete)
            .unwrap()
            .with_pattern("(a+)+")
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsafePattern { .. }));
    }

    #[test]
    fn pattern_rule_matches_directly() {
        let rule = Rule::new(RuleKind::Spam, 0.6, RuleAction::Delete)
            .unwrap()
            .with_pattern("free money")
            .unwrap()
            .with_confidence(0.9);

        assert_eq!(rule.match_text("get FREE MONEY now"), Some(0.9));
        assert_eq!(rule.match_text("perfectly fine message"), None);
    }

    #[test]
    fn length_rule_counts_characters() {
        let rule = Rule::new(RuleKind::Custom, 0.9, RuleAction::Warn)
            .unwrap()
            .with_max_length(5)
            .with_confidence(0.8);

        assert_eq!(rule.match_text("sixsix"), Some(0.8));
        assert_eq!(rule.match_text("five5"), None);
    }

    #[test]
    fn spec_round_trip_preserves_pattern_source() {
        let rule = Rule::new(RuleKind::Custom, 0.9, RuleAction::Delete)
            .unwrap()
            .with_pattern("buy .* coins")
            .unwrap();

        let spec = RuleSpec::from(&rule);
        assert_eq!(spec.pattern.as_deref(), Some("buy .* coins"));

        let recompiled = spec.compile().unwrap();
        assert!(recompiled.match_text("BUY cheap COINS").is_some());
    }
}
