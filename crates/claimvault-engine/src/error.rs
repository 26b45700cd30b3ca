//! Engine error types.

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use claimvault_core::ErrorKind;
use claimvault_opendal::StorageError;
use claimvault_postgres::PgError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while driving the document lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The actor is not allowed to perform the operation.
    #[error("not authorized: {0}")]
    Unauthorized(&'static str),

    /// The referenced claim or document does not exist.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// The claim already holds the maximum number of documents.
    #[error("claim {claim_id} already holds {limit} documents")]
    CapacityExceeded {
        /// The claim that is at capacity.
        claim_id: Uuid,
        /// The enforced per-claim limit.
        limit: i64,
    },

    /// The presigned upload URL expired before the bytes arrived.
    #[error("upload window expired")]
    UploadExpired,

    /// The object store refused or failed the operation.
    #[error("object store unavailable: {0}")]
    StoreUnavailable(String),

    /// Staging-layer failure (validation or local I/O).
    #[error(transparent)]
    Staging(#[from] claimvault_core::Error),

    /// Metadata repository failure.
    #[error(transparent)]
    Repository(#[from] PgError),

    /// Object store client failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Local filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Maps this error to the per-file rejection reason reported to callers.
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            Self::CapacityExceeded { .. } => RejectReason::CapacityExceeded,
            Self::UploadExpired => RejectReason::UploadExpired,
            Self::StoreUnavailable(_) | Self::Storage(_) => RejectReason::StoreUnavailable,
            Self::Staging(err) => match err.kind() {
                ErrorKind::UnsupportedMediaType => RejectReason::UnsupportedMediaType,
                ErrorKind::FileTooLarge => RejectReason::FileTooLarge,
                _ => RejectReason::Internal,
            },
            _ => RejectReason::Internal,
        }
    }
}

/// Why one file of an ingestion batch was not stored.
///
/// Per-file failures do not fail the batch; callers inspect the outcome of
/// every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The claim already holds the maximum number of documents.
    CapacityExceeded,
    /// The declared media type is not accepted.
    UnsupportedMediaType,
    /// The file exceeds the per-file size limit.
    FileTooLarge,
    /// The presigned upload URL expired before the bytes arrived.
    UploadExpired,
    /// The object store refused or failed the upload.
    StoreUnavailable,
    /// An unexpected internal failure.
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_mapping() {
        let err = EngineError::CapacityExceeded {
            claim_id: Uuid::new_v4(),
            limit: 15,
        };
        assert_eq!(err.reject_reason(), RejectReason::CapacityExceeded);

        assert_eq!(
            EngineError::UploadExpired.reject_reason(),
            RejectReason::UploadExpired
        );

        let staging = EngineError::Staging(claimvault_core::Error::unsupported_media_type());
        assert_eq!(staging.reject_reason(), RejectReason::UnsupportedMediaType);

        let staging = EngineError::Staging(claimvault_core::Error::file_too_large());
        assert_eq!(staging.reject_reason(), RejectReason::FileTooLarge);

        let internal = EngineError::Internal("boom".into());
        assert_eq!(internal.reject_reason(), RejectReason::Internal);
    }

    #[test]
    fn test_reject_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&RejectReason::CapacityExceeded).unwrap(),
            "\"capacity_exceeded\""
        );
        assert_eq!(RejectReason::UploadExpired.to_string(), "upload_expired");
    }
}
