//! Input validation and path confinement
//!
//! Runs before the cache lookup and before any scoring unit is scheduled;
//! an oversized or unsafe payload never touches a model.

use modwatch_core::{ContentItem, Modality, ValidationError};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use crate::config::SizeLimits;

/// Enforces payload ceilings and filesystem confinement
#[derive(Debug, Clone)]
pub struct InputValidator {
    limits: SizeLimits,
}

impl InputValidator {
    pub fn new(limits: SizeLimits) -> Self {
        Self { limits }
    }

    /// Check an inbound item against the hard size ceilings.
    pub fn validate(&self, item: &ContentItem) -> Result<(), ValidationError> {
        let size = item.payload.len();

        if size == 0 && item.modality != Modality::Text {
            return Err(ValidationError::Empty);
        }

        let limit = match item.modality {
            Modality::Text => self.limits.max_text_bytes,
            Modality::Image => self.limits.max_image_bytes,
            Modality::Video => self.limits.max_video_bytes,
        };

        if size > limit {
            return Err(ValidationError::Oversized {
                modality: item.modality.as_str(),
                size,
                limit,
            });
        }

        Ok(())
    }

    /// Confine a payload-derived file name to the given scratch directory.
    ///
    /// Rejects traversal sequences, absolute paths, and backslash tricks
    /// before joining, then re-checks the joined path by component so a
    /// crafted name cannot climb out.
    pub fn sanitize_path(
        &self,
        candidate: &str,
        base: &Path,
    ) -> Result<PathBuf, ValidationError> {
        if candidate.is_empty()
            || candidate.contains("..")
            || candidate.contains('\\')
            || candidate.starts_with('/')
        {
            warn!(path = %candidate, "path traversal attempt rejected");
            return Err(ValidationError::PathTraversal(candidate.to_string()));
        }

        let joined = base.join(candidate);
        let escapes = joined
            .components()
            .any(|c| matches!(c, Component::ParentDir))
            || !joined.starts_with(base);
        if escapes {
            warn!(path = %candidate, "path traversal attempt rejected");
            return Err(ValidationError::PathTraversal(candidate.to_string()));
        }

        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> InputValidator {
        InputValidator::new(SizeLimits::default())
    }

    #[test]
    fn text_within_limit_passes() {
        let item = ContentItem::text("u1", "c1", "a".repeat(4096));
        assert!(validator().validate(&item).is_ok());
    }

    #[test]
    fn oversized_text_is_rejected() {
        let item = ContentItem::text("u1", "c1", "a".repeat(4097));
        assert!(matches!(
            validator().validate(&item),
            Err(ValidationError::Oversized { modality: "text", .. })
        ));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let item = ContentItem::image("u1", "c1", vec![0u8; 10 * 1024 * 1024 + 1]);
        assert!(matches!(
            validator().validate(&item),
            Err(ValidationError::Oversized { modality: "image", .. })
        ));
    }

    #[test]
    fn oversized_video_is_rejected() {
        let item = ContentItem::video("u1", "c1", vec![0u8; 50 * 1024 * 1024 + 1]);
        assert!(matches!(
            validator().validate(&item),
            Err(ValidationError::Oversized { modality: "video", .. })
        ));
    }

    #[test]
    fn empty_media_is_rejected() {
        let item = ContentItem::image("u1", "c1", Vec::<u8>::new());
        assert!(matches!(
            validator().validate(&item),
            Err(ValidationError::Empty)
        ));
    }

    #[test]
    fn traversal_sequences_are_rejected() {
        let v = validator();
        let base = Path::new("/tmp/modwatch");
        assert!(v.sanitize_path("../etc/passwd", base).is_err());
        assert!(v.sanitize_path("/etc/passwd", base).is_err());
        assert!(v.sanitize_path("a\\..\\b", base).is_err());
        assert!(v.sanitize_path("", base).is_err());
    }

    #[test]
    fn plain_names_are_confined() {
        let v = validator();
        let base = Path::new("/tmp/modwatch");
        let path = v.sanitize_path("frame_0.jpg", base).unwrap();
        assert!(path.starts_with(base));
        assert!(path.ends_with("frame_0.jpg"));
    }
}
