//! modwatch Engine
//!
//! The moderation decision engine: one `moderate(ContentItem)` call turns
//! raw content plus the active policy into a scored verdict, under
//! caching, rate-limiting, and bounded-concurrency constraints.
//!
//! The messaging-platform client, dashboards, and model distribution are
//! external collaborators; this crate is the decision core they call.

pub mod cache;
pub mod config;
pub mod limiter;
pub mod orchestrator;
pub mod patterns;
pub mod secrets;
pub mod validate;

pub use cache::VerdictCache;
pub use config::{EngineConfig, SizeLimits};
pub use limiter::RateLimiter;
pub use orchestrator::{Health, Moderator};
pub use patterns::{ThreatDetector, ThreatKind, ThreatPattern};
pub use secrets::{SecretManager, SecretString};
pub use validate::InputValidator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::orchestrator::{Health, Moderator};
    pub use crate::secrets::SecretManager;
    pub use modwatch_core::prelude::*;
    pub use modwatch_policy::prelude::*;
    pub use modwatch_scoring::prelude::*;
}
