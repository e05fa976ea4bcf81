//! modwatch Scoring
//!
//! Pluggable content scorers behind a uniform capability interface.
//!
//! Scorers are selected by item modality and declare the rule kinds they
//! produce plus a latency budget. The built-in set covers keyword
//! indicators, a caps heuristic, and an image header probe; production
//! ML classifiers register through the same [`Scorer`] trait.

pub mod frames;
pub mod heuristics;
pub mod image;
pub mod keywords;
pub mod registry;
pub mod scorer;

pub use frames::{FrameSampler, DEFAULT_MAX_FRAMES};
pub use heuristics::CapsScorer;
pub use image::ImageHeuristicScorer;
pub use keywords::KeywordScorer;
pub use registry::ScorerRegistry;
pub use scorer::{Scorer, DEFAULT_SCORE_TIMEOUT};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::frames::FrameSampler;
    pub use crate::registry::ScorerRegistry;
    pub use crate::scorer::Scorer;
}
