//! Document model for PostgreSQL database operations.

use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::documents;
use crate::types::DocumentKind;

/// Document model representing one uploaded file attached to a claim.
///
/// A row exists exactly when the backing object does, outside of the
/// in-flight window while an upload or deletion is being confirmed.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Document {
    /// Unique document identifier
    pub id: Uuid,
    /// Claim this document belongs to
    pub claim_id: Uuid,
    /// Account that uploaded the document
    pub account_id: Uuid,
    /// Opaque key the bytes live under in the object store
    pub object_key: String,
    /// Filename the document was uploaded as (display only)
    pub original_name: String,
    /// Document kind category
    pub kind: DocumentKind,
    /// MIME type of the stored bytes
    pub content_type: String,
    /// Stored size in bytes
    pub size_bytes: i64,
    /// Timestamp when the document was confirmed
    pub created_at: jiff_diesel::Timestamp,
}

/// Data for creating a new document record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocument {
    /// Claim the document belongs to
    pub claim_id: Uuid,
    /// Uploading account
    pub account_id: Uuid,
    /// Opaque object store key
    pub object_key: String,
    /// Filename the document was uploaded as
    pub original_name: String,
    /// Document kind category
    pub kind: DocumentKind,
    /// MIME type of the bytes
    pub content_type: String,
    /// Size in bytes
    pub size_bytes: i64,
}

impl Document {
    /// Returns whether the given account uploaded this document.
    #[inline]
    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.account_id == account_id
    }

    /// Returns whether the document is a scanned image.
    #[inline]
    pub fn is_scan(&self) -> bool {
        self.kind.is_scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_and_kind() {
        let owner = Uuid::new_v4();
        let document = Document {
            id: Uuid::new_v4(),
            claim_id: Uuid::new_v4(),
            account_id: owner,
            object_key: "documents/scan-0.jpg".into(),
            original_name: "receipt.jpg".into(),
            kind: DocumentKind::Scan,
            content_type: "image/jpeg".into(),
            size_bytes: 1024,
            created_at: jiff::Timestamp::now().into(),
        };

        assert!(document.is_owned_by(owner));
        assert!(!document.is_owned_by(Uuid::new_v4()));
        assert!(document.is_scan());
    }
}
