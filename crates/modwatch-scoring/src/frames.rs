//! Video frame sampling
//!
//! Selects a bounded, deterministic set of frames — first, last, and
//! evenly spaced interior frames — so scoring cost is independent of
//! video length. The bundled extractor understands JPEG-delimited
//! (MJPEG-style) streams; other containers arrive pre-extracted from
//! the media collaborator.

use bytes::Bytes;
use modwatch_core::{Error, Result};
use tracing::debug;

/// Default frame budget per video
pub const DEFAULT_MAX_FRAMES: usize = 8;

/// Deterministic frame sampler
pub struct FrameSampler {
    max_frames: usize,
}

impl FrameSampler {
    pub fn new(max_frames: usize) -> Self {
        Self { max_frames }
    }

    /// Extract up to `max_frames` representative frames.
    ///
    /// Zero-duration or corrupt input fails with [`Error::EmptyVideo`]
    /// rather than producing garbage for the scorers.
    pub fn sample(&self, video: &[u8]) -> Result<Vec<Bytes>> {
        let frames = scan_jpeg_frames(video);
        if frames.is_empty() {
            return Err(Error::EmptyVideo);
        }

        let picked = sample_indices(frames.len(), self.max_frames);
        debug!(
            total = frames.len(),
            sampled = picked.len(),
            "sampled video frames"
        );

        Ok(picked
            .into_iter()
            .map(|i| {
                let (start, end) = frames[i];
                Bytes::copy_from_slice(&video[start..end])
            })
            .collect())
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAMES)
    }
}

/// Choose up to `max` indices out of `total`: first, last, and evenly
/// spaced interior positions. Deterministic for a given input.
pub fn sample_indices(total: usize, max: usize) -> Vec<usize> {
    if total == 0 || max == 0 {
        return Vec::new();
    }
    if total <= max {
        return (0..total).collect();
    }
    if max == 1 {
        return vec![0];
    }

    let mut indices = Vec::with_capacity(max);
    for i in 0..max {
        indices.push(i * (total - 1) / (max - 1));
    }
    indices.dedup();
    indices
}

/// Byte ranges of SOI..EOI delimited JPEG frames.
///
/// An unterminated trailing frame is dropped; the caller treats an empty
/// scan as corrupt input.
fn scan_jpeg_frames(data: &[u8]) -> Vec<(usize, usize)> {
    let mut frames = Vec::new();
    let mut i = 0;

    while i + 1 < data.len() {
        if data[i] == 0xff && data[i + 1] == 0xd8 {
            let start = i;
            let mut j = i + 2;
            let mut end = None;
            while j + 1 < data.len() {
                if data[j] == 0xff && data[j + 1] == 0xd9 {
                    end = Some(j + 2);
                    break;
                }
                j += 1;
            }
            match end {
                Some(end) => {
                    frames.push((start, end));
                    i = end;
                }
                None => break,
            }
        } else {
            i += 1;
        }
    }

    frames
}
