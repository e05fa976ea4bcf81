//! Policy assembly and the atomic policy store

use modwatch_core::RuleKind;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::parser;
use crate::rule::{ParseError, Rule, RuleSpec};

/// An ordered, immutable set of compiled rules.
///
/// Kinds are unique except `Custom`; declaration order is significant —
/// it breaks confidence ties during aggregation.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    rules: Vec<Rule>,
}

impl Policy {
    /// Build a policy from compiled rules, enforcing kind uniqueness.
    pub fn new(rules: Vec<Rule>) -> Result<Self, ParseError> {
        let mut seen: Vec<RuleKind> = Vec::new();
        for rule in &rules {
            if rule.kind != RuleKind::Custom {
                if seen.contains(&rule.kind) {
                    return Err(ParseError::DuplicateKind(rule.kind.as_str()));
                }
                seen.push(rule.kind);
            }
        }
        Ok(Self { rules })
    }

    /// Build a policy from structured rule records.
    ///
    /// All-or-nothing: every record must compile or the whole load fails
    /// with the full error list.
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self, Vec<ParseError>> {
        let mut rules = Vec::with_capacity(specs.len());
        let mut errors = Vec::new();

        for spec in specs {
            match spec.compile() {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Self::new(rules).map_err(|e| vec![e])
    }

    /// Build a policy from a natural-language rule document.
    ///
    /// Redundant scorer-backed rules for an already-declared kind are
    /// dropped (first declaration wins), matching the tie-break order.
    pub fn from_sentences(doc: &str) -> Result<Self, Vec<ParseError>> {
        let parsed = parser::parse_document(doc)?;

        let mut rules: Vec<Rule> = Vec::with_capacity(parsed.len());
        for rule in parsed {
            let duplicate = rule.kind != RuleKind::Custom
                && rules.iter().any(|existing| existing.kind == rule.kind);
            if duplicate {
                debug!(kind = rule.kind.as_str(), "dropping redundant rule for kind");
                continue;
            }
            rules.push(rule);
        }

        Self::new(rules).map_err(|e| vec![e])
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Export as structured records (JSON)
    pub fn to_json(&self) -> modwatch_core::Result<String> {
        let specs: Vec<RuleSpec> = self.rules.iter().map(RuleSpec::from).collect();
        Ok(serde_json::to_string_pretty(&specs)?)
    }

    /// Import from structured records (JSON)
    pub fn from_json(json: &str) -> Result<Self, Vec<ParseError>> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json).map_err(|e| {
            vec![ParseError::Unrecognized(format!("invalid rule records: {e}"))]
        })?;
        Self::from_specs(&specs)
    }
}

/// Shared handle to the active policy.
///
/// Replacement is atomic: readers clone the `Arc` under a brief read lock,
/// so an in-flight request keeps the policy it started with and never
/// observes a partially updated rule set.
#[derive(Debug)]
pub struct PolicyStore {
    inner: RwLock<Arc<Policy>>,
}

impl PolicyStore {
    pub fn new(policy: Policy) -> Self {
        Self {
            inner: RwLock::new(Arc::new(policy)),
        }
    }

    /// Snapshot of the active policy
    pub fn load(&self) -> Arc<Policy> {
        Arc::clone(&self.inner.read())
    }

    /// Atomically activate a replacement policy
    pub fn swap(&self, policy: Policy) {
        info!(rules = policy.len(), "activating replacement policy");
        *self.inner.write() = Arc::new(policy);
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}
