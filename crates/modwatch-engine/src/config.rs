//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Verdict cache capacity (entries)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Sustained per-source action rate
    #[serde(default = "default_messages_per_second")]
    pub messages_per_second: f64,

    /// Instantaneous per-source burst allowance
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// Maximum tracked rate-limit sources before idle buckets are evicted
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Scoring worker pool size, shared across all requests
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Frame budget per video
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,

    /// Directory derived media paths are confined to
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Payload size ceilings
    #[serde(default)]
    pub limits: SizeLimits,
}

impl EngineConfig {
    /// Load configuration from a YAML file, or defaults if absent
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            messages_per_second: default_messages_per_second(),
            burst_size: default_burst_size(),
            max_sources: default_max_sources(),
            max_concurrency: default_max_concurrency(),
            max_frames: default_max_frames(),
            scratch_dir: default_scratch_dir(),
            limits: SizeLimits::default(),
        }
    }
}

/// Hard payload ceilings per modality
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeLimits {
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,

    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_text_bytes: default_max_text_bytes(),
            max_image_bytes: default_max_image_bytes(),
            max_video_bytes: default_max_video_bytes(),
        }
    }
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_messages_per_second() -> f64 {
    10.0
}

fn default_burst_size() -> u32 {
    20
}

fn default_max_sources() -> usize {
    10_000
}

fn default_max_concurrency() -> usize {
    num_cpus::get()
}

fn default_max_frames() -> usize {
    8
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("modwatch")
}

fn default_max_text_bytes() -> usize {
    4 * 1024
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_video_bytes() -> usize {
    50 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_ceilings() {
        let config = EngineConfig::default();
        assert_eq!(config.limits.max_text_bytes, 4096);
        assert_eq!(config.limits.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(config.limits.max_video_bytes, 50 * 1024 * 1024);
        assert_eq!(config.cache_capacity, 1000);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: EngineConfig = serde_yaml::from_str("cache_capacity: 10\n").unwrap();
        assert_eq!(config.cache_capacity, 10);
        assert_eq!(config.burst_size, 20);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = EngineConfig::load("/nonexistent/modwatch.yaml").unwrap();
        assert_eq!(config.cache_capacity, 1000);
    }
}
