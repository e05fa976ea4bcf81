//! Error types for modwatch

use std::time::Duration;

/// Result type alias using modwatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for moderation engine operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected before any scoring was scheduled
    #[error("rejected input: {0}")]
    Validation(#[from] ValidationError),

    /// Policy authoring errors (bad sentence, bad record)
    #[error("policy error: {0}")]
    Policy(String),

    /// A rule pattern failed the ReDoS safety check
    #[error("unsafe pattern rejected: {0}")]
    UnsafePattern(String),

    /// Sealed secret failed its authentication check
    #[error("secret integrity check failed")]
    Integrity,

    /// A scorer exceeded its declared timeout
    #[error("scorer '{name}' timed out after {timeout:?}")]
    ScorerTimeout { name: String, timeout: Duration },

    /// A scorer raised an internal fault
    #[error("scorer '{name}' failed: {message}")]
    ScorerFault { name: String, message: String },

    /// Video input produced no usable frames
    #[error("video contains no usable frames")]
    EmptyVideo,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new policy error
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new scorer fault
    pub fn scorer_fault(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScorerFault {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Why an inbound item was rejected before scoring
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Payload exceeds the hard ceiling for its modality
    #[error("{modality} payload of {size} bytes exceeds the {limit}-byte limit")]
    Oversized {
        modality: &'static str,
        size: usize,
        limit: usize,
    },

    /// Payload is empty
    #[error("payload is empty")]
    Empty,

    /// A derived filesystem path escapes the scratch directory
    #[error("path escapes the scratch directory: {0}")]
    PathTraversal(String),
}
