//! Natural-language rule parser
//!
//! Converts admin-written policy statements ("don't allow 'spam' messages")
//! into compiled rules. The vocabulary is fixed: a small set of verbs and
//! negations, subject keywords mapped to rule kinds, quoted literals as
//! pattern sources. Pure text-to-rules; no side effects.

use modwatch_core::{RuleAction, RuleKind};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::rule::{default_threshold, ParseError, Rule};

fn verb_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"don't allow|do not allow|block|remove|ban|\bno\b")
            .expect("hard-coded regex compiles")
    })
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']([^"']+)["']"#).expect("hard-coded regex compiles"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:don't allow|do not allow|block|no)\s+(?:all\s+|any\s+)?links?\s+(?:to\s+)?([a-z0-9][a-z0-9.-]*\.[a-z]{2,})",
        )
        .expect("hard-coded regex compiles")
    })
}

fn length_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:longer than|more than|limit(?:\s+messages?)?\s+to|max(?:imum)?(?:\s+message)?\s+length(?:\s+is)?)\s+(\d+)",
        )
        .expect("hard-coded regex compiles")
    })
}

/// Subject keywords mapped to rule kinds
const KIND_KEYWORDS: &[(RuleKind, &[&str])] = &[
    (RuleKind::Spam, &["spam", "repetitive", "repeated", "advertis"]),
    (
        RuleKind::Harassment,
        &["harass", "bully", "bullying", "insult", "abusive"],
    ),
    (
        RuleKind::Nsfw,
        &["nsfw", "adult content", "explicit", "porn", "inappropriate"],
    ),
    (RuleKind::HateSpeech, &["hate"]),
    (RuleKind::Caps, &["caps", "capital letter", "shouting"]),
    (RuleKind::Violence, &["violence", "violent", "gore"]),
];

/// Rule kinds mentioned in a sentence, in vocabulary order, deduplicated
fn detect_kinds(sentence: &str) -> Vec<RuleKind> {
    let mut kinds = Vec::new();
    for (kind, keywords) in KIND_KEYWORDS {
        if keywords.iter().any(|kw| sentence.contains(kw)) {
            kinds.push(*kind);
        }
    }
    kinds
}

/// Parse a single policy sentence into one or more rules.
///
/// Fails with [`ParseError::Unrecognized`] when nothing in the sentence
/// matches the vocabulary, and with [`ParseError::UnsafePattern`] when a
/// quoted literal fails the ReDoS safety check.
pub fn parse_sentence(sentence: &str) -> Result<Vec<Rule>, ParseError> {
    let original = sentence.trim();
    let s = original.to_lowercase();
    if s.is_empty() {
        return Err(ParseError::Unrecognized(original.to_string()));
    }

    let mut rules = Vec::new();

    let verb = verb_re().find(&s);
    let action = verb.map(|m| {
        if m.as_str() == "no" {
            RuleAction::Warn
        } else {
            RuleAction::Delete
        }
    });

    // Domain blocks: "block links to free-coins.net"
    if let Some(cap) = url_re().captures(&s) {
        let domain = cap[1].to_string();
        let rule = Rule::new(
            RuleKind::Custom,
            default_threshold(RuleKind::Custom),
            RuleAction::Delete,
        )?
        .with_pattern(&regex::escape(&domain))?
        .with_reason(format!("blocked domain: {domain}"))
        .with_confidence(0.95);
        rules.push(rule);
    }

    let kinds = detect_kinds(&s);

    // Quoted literals after the verb become pattern rules
    let mut literals: Vec<String> = Vec::new();
    if let Some(m) = verb {
        for cap in quoted_re().captures_iter(&s[m.end()..]) {
            literals.push(cap[1].to_string());
        }
    }
    // A lone literal inherits the lone subject kind; anything more
    // ambiguous lands in the custom bucket.
    let literal_kind = if literals.len() == 1 && kinds.len() == 1 {
        kinds[0]
    } else {
        RuleKind::Custom
    };
    for literal in &literals {
        let rule = Rule::new(
            literal_kind,
            default_threshold(literal_kind),
            action.unwrap_or(RuleAction::Delete),
        )?
        .with_pattern(literal)?
        .with_reason(format!("blocked pattern: {literal}"))
        .with_confidence(0.9);
        rules.push(rule);
    }

    // Length limits: "limit messages to 500 characters"
    if let Some(cap) = length_re().captures(&s) {
        if let Ok(max) = cap[1].parse::<usize>() {
            let rule = Rule::new(
                RuleKind::Custom,
                default_threshold(RuleKind::Custom),
                RuleAction::Warn,
            )?
            .with_max_length(max)
            .with_reason(format!("message too long (max {max} characters)"))
            .with_confidence(0.8);
            rules.push(rule);
        }
    }

    // Remaining subject kinds become scorer-backed rules
    if let Some(action) = action {
        for &kind in &kinds {
            if !rules.iter().any(|r| r.kind == kind) {
                let rule = Rule::new(kind, default_threshold(kind), action)?
                    .with_reason(format!("{} content", kind.as_str()));
                rules.push(rule);
            }
        }
    }

    if rules.is_empty() {
        return Err(ParseError::Unrecognized(original.to_string()));
    }

    debug!(sentence = %original, count = rules.len(), "parsed policy sentence");
    Ok(rules)
}

/// Parse a whole rule document, one statement per sentence or line.
///
/// All-or-nothing: any unparseable sentence fails the document, and all
/// collected errors are returned so the operator can fix them in one pass.
pub fn parse_document(doc: &str) -> Result<Vec<Rule>, Vec<ParseError>> {
    let mut rules = Vec::new();
    let mut errors = Vec::new();

    for sentence in doc.split(|c: char| matches!(c, '.' | '!' | '?' | '\n')) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        match parse_sentence(sentence) {
            Ok(parsed) => rules.extend(parsed),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    if rules.is_empty() {
        return Err(vec![ParseError::Unrecognized(doc.trim().to_string())]);
    }
    Ok(rules)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // The parser sees arbitrary operator input; it must reject, never panic.
        #[test]
        fn parse_never_panics(input in ".{0,300}") {
            let _ = parse_document(&input);
        }

        #[test]
        fn safety_check_never_panics(input in ".{0,200}") {
            let _ = crate::safety::check_pattern(&input);
        }
    }
}
