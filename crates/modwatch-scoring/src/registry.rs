//! Scorer registry keyed by modality

use modwatch_core::{Modality, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::heuristics::CapsScorer;
use crate::image::ImageHeuristicScorer;
use crate::keywords::KeywordScorer;
use crate::scorer::Scorer;

/// Registry of pluggable scorers, selected by item modality.
///
/// The registry is immutable once built; the orchestrator shares one
/// instance across all concurrent requests.
#[derive(Default)]
pub struct ScorerRegistry {
    scorers: HashMap<Modality, Vec<Arc<dyn Scorer>>>,
}

impl ScorerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scorer under its declared modality
    pub fn register(&mut self, scorer: Arc<dyn Scorer>) {
        self.scorers
            .entry(scorer.modality())
            .or_default()
            .push(scorer);
    }

    /// Scorers registered for a modality
    pub fn for_modality(&self, modality: Modality) -> &[Arc<dyn Scorer>] {
        self.scorers
            .get(&modality)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of registered scorers
    pub fn len(&self) -> usize {
        self.scorers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registry with the built-in keyword, caps, and image scorers
    pub fn with_builtin_scorers() -> Result<Self> {
        let mut registry = Self::new();

        registry.register(Arc::new(KeywordScorer::spam()?));
        registry.register(Arc::new(KeywordScorer::harassment()?));
        registry.register(Arc::new(KeywordScorer::nsfw()?));
        registry.register(Arc::new(KeywordScorer::hate_speech()?));
        registry.register(Arc::new(KeywordScorer::violence()?));
        registry.register(Arc::new(CapsScorer));
        registry.register(Arc::new(ImageHeuristicScorer::new()));

        info!(count = registry.len(), "initialized built-in scorers");
        Ok(registry)
    }
}
