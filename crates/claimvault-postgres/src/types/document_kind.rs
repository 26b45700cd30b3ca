//! Document kind enumeration for uploaded claim documents.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines what category of evidence an uploaded document carries.
///
/// This enumeration corresponds to the `DOCUMENT_KIND` PostgreSQL enum.
/// PDFs carry extractable text; images are scans of physical paperwork.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::DocumentKind"]
pub enum DocumentKind {
    /// Text-bearing document (PDF)
    #[db_rename = "text"]
    #[serde(rename = "TEXT")]
    Text,

    /// Scanned image of physical paperwork
    #[db_rename = "scan"]
    #[serde(rename = "SCAN")]
    Scan,
}

impl DocumentKind {
    /// Returns whether the document is a scanned image.
    #[inline]
    pub fn is_scan(self) -> bool {
        matches!(self, DocumentKind::Scan)
    }

    /// Returns whether the document carries extractable text.
    #[inline]
    pub fn is_text(self) -> bool {
        matches!(self, DocumentKind::Text)
    }
}
