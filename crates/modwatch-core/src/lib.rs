//! modwatch Core
//!
//! Core types, content hashing, and error handling shared across the
//! modwatch moderation engine.
//!
//! This crate provides:
//! - Common types for content items, score vectors, and verdicts
//! - Error types and result handling
//! - Content hashing for cache keys

pub mod error;
pub mod hash;
pub mod types;

pub use error::{Error, Result, ValidationError};
pub use hash::ContentHash;
pub use types::{
    ContentItem, ContentPayload, Modality, ModerationResult, RuleAction, RuleKind, ScoreVector,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result, ValidationError};
    pub use crate::hash::ContentHash;
    pub use crate::types::{
        ContentItem, Modality, ModerationResult, RuleAction, RuleKind, ScoreVector,
    };
}
