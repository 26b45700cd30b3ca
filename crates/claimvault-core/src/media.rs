//! Accepted upload media types.
//!
//! This module provides the [`MediaType`] enum, the single mapping table from
//! declared MIME types to file extensions, storage name prefixes and document
//! categories. Every component that needs to reason about an upload's type
//! goes through this table rather than inspecting MIME strings ad hoc.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Media types accepted for document upload.
///
/// Anything not representable here is rejected at the staging boundary with
/// `UnsupportedMediaType` before any disk or storage activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// JPEG image (`image/jpeg`).
    Jpeg,
    /// PNG image (`image/png`).
    Png,
    /// PDF document (`application/pdf`).
    Pdf,
}

impl MediaType {
    /// Resolves a declared MIME type to an accepted media type.
    ///
    /// Returns `None` for anything outside the accepted set.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Returns the canonical MIME type.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    /// Returns the file extension (without the dot).
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    /// Returns the prefix used when deriving opaque storage names.
    #[must_use]
    pub fn storage_prefix(self) -> &'static str {
        match self {
            Self::Jpeg | Self::Png => "scan",
            Self::Pdf => "text",
        }
    }

    /// Check if this media type is an image.
    #[must_use]
    pub fn is_image(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_mimes() {
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("image/png"), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime("application/pdf"), Some(MediaType::Pdf));
    }

    #[test]
    fn test_rejected_mimes() {
        assert_eq!(MediaType::from_mime("text/plain"), None);
        assert_eq!(MediaType::from_mime("image/gif"), None);
        assert_eq!(MediaType::from_mime("application/zip"), None);
        assert_eq!(MediaType::from_mime(""), None);
        // Prefix matches are not enough, the full type must be known.
        assert_eq!(MediaType::from_mime("image/"), None);
    }

    #[test]
    fn test_mime_roundtrip() {
        for media in [MediaType::Jpeg, MediaType::Png, MediaType::Pdf] {
            assert_eq!(MediaType::from_mime(media.mime()), Some(media));
        }
    }

    #[test]
    fn test_storage_prefix() {
        assert_eq!(MediaType::Jpeg.storage_prefix(), "scan");
        assert_eq!(MediaType::Png.storage_prefix(), "scan");
        assert_eq!(MediaType::Pdf.storage_prefix(), "text");
    }

    #[test]
    fn test_predicates() {
        assert!(MediaType::Jpeg.is_image());
        assert!(MediaType::Png.is_image());
        assert!(!MediaType::Pdf.is_image());
    }

    #[test]
    fn test_display() {
        assert_eq!(MediaType::Jpeg.to_string(), "jpeg");
        assert_eq!(MediaType::Pdf.to_string(), "pdf");
    }
}
