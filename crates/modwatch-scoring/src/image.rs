//! Image heuristic scorer
//!
//! Probes JPEG/PNG headers for dimensions without a full decode. An
//! undecodable image is a scorer fault (the orchestrator records it as
//! unknown and degrades the verdict); extreme dimensions raise the risk
//! floor the way oversize media has historically been flagged.

use async_trait::async_trait;
use modwatch_core::{ContentItem, Error, Modality, Result, RuleKind, ScoreVector};
use tracing::debug;

use crate::scorer::Scorer;

/// Dimensions past this are treated as a risk signal rather than scored
const DEFAULT_MAX_DIMENSION: u32 = 4000;

/// Confidence floor recorded for oversized media
const OVERSIZE_CONFIDENCE: f32 = 0.6;

/// Header-probe scorer for image items
pub struct ImageHeuristicScorer {
    max_dimension: u32,
}

impl ImageHeuristicScorer {
    pub fn new() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

impl Default for ImageHeuristicScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for ImageHeuristicScorer {
    async fn score(&self, item: &ContentItem) -> Result<ScoreVector> {
        let mut scores = ScoreVector::new();
        let Some(data) = item.binary_body() else {
            return Ok(scores);
        };

        let (width, height) = probe_dimensions(data)
            .ok_or_else(|| Error::scorer_fault(self.name(), "undecodable image payload"))?;

        if width > self.max_dimension || height > self.max_dimension {
            debug!(width, height, "image dimensions past the sanity ceiling");
            scores.record(RuleKind::Nsfw, OVERSIZE_CONFIDENCE);
        } else {
            scores.record(RuleKind::Nsfw, 0.0);
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        "image-heuristic"
    }

    fn modality(&self) -> Modality {
        Modality::Image
    }

    fn kinds(&self) -> &[RuleKind] {
        &[RuleKind::Nsfw]
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Read image dimensions from a JPEG or PNG header.
///
/// Returns `None` for anything that is not a recognizable image, which
/// the scorer reports as a fault.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.starts_with(&PNG_SIGNATURE) {
        return png_dimensions(data);
    }
    if data.starts_with(&[0xff, 0xd8]) {
        return jpeg_dimensions(data);
    }
    None
}

/// PNG: the IHDR chunk directly follows the signature
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}

/// JPEG: walk the marker segments until a start-of-frame
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xff {
            return None;
        }
        let marker = data[i + 1];
        match marker {
            // Padding between segments
            0xff => i += 1,
            // Standalone markers carry no length
            0x01 | 0xd0..=0xd7 => i += 2,
            // Start-of-frame variants hold the dimensions
            0xc0..=0xc3 | 0xc5..=0xc7 | 0xc9..=0xcb | 0xcd..=0xcf => {
                if i + 9 > data.len() {
                    return None;
                }
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
                return Some((width, height));
            }
            _ => {
                let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
                if len < 2 {
                    return None;
                }
                i += 2 + len;
            }
        }
    }
    None
}
