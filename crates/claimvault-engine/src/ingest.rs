//! Ingestion orchestration.
//!
//! Drives the per-file upload protocol: reserve capacity, persist the
//! metadata row, stream the bytes to the object store, then confirm or
//! compensate. The metadata row is created before the bytes are durable so
//! the capacity reservation is visible to concurrent siblings; any failure
//! after that point deletes the row again before the file's unit of work
//! ends.

use serde::Serialize;
use uuid::Uuid;

use claimvault_core::MediaType;
use claimvault_core::fs::StagedFile;
use claimvault_postgres::model::NewDocument;
use claimvault_postgres::query::CapacityCheckedInsert;
use claimvault_postgres::types::DocumentKind;

use crate::TRACING_TARGET_INGEST;
use crate::actor::Actor;
use crate::engine::DocumentEngine;
use crate::error::{EngineError, EngineResult, RejectReason};
use crate::store::{BlobStore, DocumentIndex};

/// Outcome for one file of an ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// The document was stored and its metadata row confirmed.
    Accepted {
        /// Identifier of the created document.
        document_id: Uuid,
        /// Object store key the bytes live under.
        object_key: String,
        /// Name the file was uploaded as.
        original_name: String,
    },
    /// The file was not stored.
    Rejected {
        /// Name the file was uploaded as.
        original_name: String,
        /// Why the file was rejected.
        reason: RejectReason,
    },
}

impl FileOutcome {
    /// Returns the created document id, if the file was accepted.
    pub fn document_id(&self) -> Option<Uuid> {
        match self {
            Self::Accepted { document_id, .. } => Some(*document_id),
            Self::Rejected { .. } => None,
        }
    }

    /// Returns whether the file was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Per-file outcomes of one ingestion batch.
///
/// A batch succeeds as a whole even when individual files failed; callers
/// inspect the outcome of every file. Files of one batch have no causal
/// relationship, so one file's failure never rolls back its siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    /// Outcome per file, in the order the files were submitted.
    pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
    /// Returns the ids of all accepted documents.
    pub fn accepted_ids(&self) -> Vec<Uuid> {
        self.outcomes
            .iter()
            .filter_map(FileOutcome::document_id)
            .collect()
    }

    /// Returns the number of accepted files.
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_accepted()).count()
    }

    /// Returns the number of rejected files.
    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.accepted()
    }
}

impl<I, B> DocumentEngine<I, B>
where
    I: DocumentIndex,
    B: BlobStore,
{
    /// Ingests a batch of staged files into a claim.
    ///
    /// Only the claim owner may upload. Per-file work runs concurrently and
    /// is detached from the caller: once a file's unit of work has started
    /// it runs to a terminal state (confirmed or compensated) even if the
    /// caller goes away. Every staged file is removed before its unit of
    /// work ends, whatever the outcome.
    pub async fn ingest(
        &self,
        claim_id: Uuid,
        actor: Actor,
        files: Vec<StagedFile>,
    ) -> EngineResult<IngestReport> {
        let Some(owner) = self.index.claim_owner(claim_id).await? else {
            return Err(EngineError::NotFound("claim"));
        };

        // Assessors review documents, they do not submit them.
        if !actor.owns(owner) {
            return Err(EngineError::Unauthorized(
                "only the claim owner may upload documents",
            ));
        }

        let admission = self
            .guard
            .reserve(&self.index, claim_id, files.len())
            .await?;

        tracing::info!(
            target: TRACING_TARGET_INGEST,
            claim_id = %claim_id,
            files = files.len(),
            granted = admission.granted,
            "Starting ingestion batch"
        );

        let mut handles = Vec::with_capacity(files.len());
        for (position, staged) in files.into_iter().enumerate() {
            let original_name = staged.original_name().to_owned();
            let index = self.index.clone();
            let blobs = self.blobs.clone();
            let limit = self.guard.limit();
            let admitted = position < admission.granted;
            let account_id = actor.account_id;

            // Detached so a cancelled request cannot abandon a half-done
            // file between its row insert and its upload.
            let handle = tokio::spawn(async move {
                ingest_one(index, blobs, claim_id, account_id, limit, staged, admitted).await
            });

            handles.push((original_name, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (original_name, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET_INGEST,
                        claim_id = %claim_id,
                        error = %err,
                        "Ingestion task failed to complete"
                    );
                    outcomes.push(FileOutcome::Rejected {
                        original_name,
                        reason: RejectReason::Internal,
                    });
                }
            }
        }

        let report = IngestReport { outcomes };

        tracing::info!(
            target: TRACING_TARGET_INGEST,
            claim_id = %claim_id,
            accepted = report.accepted(),
            rejected = report.rejected(),
            "Ingestion batch finished"
        );

        Ok(report)
    }
}

/// Runs one file through persist, upload, confirm-or-compensate.
async fn ingest_one<I, B>(
    index: I,
    blobs: B,
    claim_id: Uuid,
    account_id: Uuid,
    limit: i64,
    staged: StagedFile,
    admitted: bool,
) -> FileOutcome
where
    I: DocumentIndex,
    B: BlobStore,
{
    let original_name = staged.original_name().to_owned();

    if !admitted {
        discard(staged).await;
        return FileOutcome::Rejected {
            original_name,
            reason: RejectReason::CapacityExceeded,
        };
    }

    let media_type = staged.media_type();
    let new_document = NewDocument {
        claim_id,
        account_id,
        object_key: object_key(media_type),
        original_name: original_name.clone(),
        kind: kind_for(media_type),
        content_type: media_type.mime().to_owned(),
        size_bytes: staged.size_bytes() as i64,
    };

    // The row goes in first so the capacity reservation is visible to
    // concurrent siblings before the bytes are durable.
    let document = match index.create_within_limit(new_document, limit).await {
        Ok(CapacityCheckedInsert::Created(document)) => document,
        Ok(CapacityCheckedInsert::LimitReached { committed }) => {
            tracing::debug!(
                target: TRACING_TARGET_INGEST,
                claim_id = %claim_id,
                committed,
                "Insert refused at capacity recheck"
            );
            discard(staged).await;
            return FileOutcome::Rejected {
                original_name,
                reason: RejectReason::CapacityExceeded,
            };
        }
        Ok(CapacityCheckedInsert::ClaimMissing) => {
            discard(staged).await;
            return FileOutcome::Rejected {
                original_name,
                reason: RejectReason::Internal,
            };
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_INGEST,
                claim_id = %claim_id,
                error = %err,
                "Metadata insert failed"
            );
            discard(staged).await;
            return FileOutcome::Rejected {
                original_name,
                reason: err.reject_reason(),
            };
        }
    };

    match blobs
        .upload(
            &document.object_key,
            &document.content_type,
            staged.path(),
            staged.size_bytes(),
        )
        .await
    {
        Ok(()) => {
            discard(staged).await;

            tracing::info!(
                target: TRACING_TARGET_INGEST,
                document_id = %document.id,
                claim_id = %claim_id,
                object_key = %document.object_key,
                "Document stored"
            );

            FileOutcome::Accepted {
                document_id: document.id,
                object_key: document.object_key,
                original_name,
            }
        }
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET_INGEST,
                document_id = %document.id,
                claim_id = %claim_id,
                error = %err,
                "Upload failed, deleting metadata row"
            );

            if let Err(delete_err) = index.delete_document(document.id).await {
                tracing::error!(
                    target: TRACING_TARGET_INGEST,
                    document_id = %document.id,
                    error = %delete_err,
                    "Compensating delete failed, row left without bytes"
                );
            }

            discard(staged).await;

            FileOutcome::Rejected {
                original_name,
                reason: err.reject_reason(),
            }
        }
    }
}

/// Derives the opaque object store key for an upload.
fn object_key(media_type: MediaType) -> String {
    format!(
        "documents/{}-{}.{}",
        media_type.storage_prefix(),
        Uuid::now_v7().simple(),
        media_type.extension()
    )
}

/// Maps an accepted media type to the document kind it is recorded as.
fn kind_for(media_type: MediaType) -> DocumentKind {
    match media_type {
        MediaType::Pdf => DocumentKind::Text,
        MediaType::Jpeg | MediaType::Png => DocumentKind::Scan,
    }
}

/// Removes a staged file, logging instead of failing.
async fn discard(staged: StagedFile) {
    let path = staged.path().to_owned();
    if let Err(err) = staged.discard().await {
        tracing::warn!(
            target: TRACING_TARGET_INGEST,
            path = %path.display(),
            error = %err,
            "Failed to remove staged file"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestHarness, staged_pdf};

    #[tokio::test]
    async fn test_batch_over_capacity_partially_succeeds() {
        let harness = TestHarness::new().await;

        let mut files = Vec::new();
        for i in 0..16 {
            files.push(staged_pdf(&harness.staging, &format!("doc-{i}.pdf")).await);
        }

        let report = harness
            .engine
            .ingest(harness.claim_id, harness.owner(), files)
            .await
            .unwrap();

        assert_eq!(report.accepted(), 15);
        assert_eq!(report.rejected(), 1);
        assert_eq!(harness.index.document_count(harness.claim_id), 15);
        assert_eq!(harness.blobs.object_count(), 15);
        assert!(harness.staging_empty());

        let rejected: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| !o.is_accepted())
            .collect();
        assert!(matches!(
            rejected[0],
            FileOutcome::Rejected {
                reason: RejectReason::CapacityExceeded,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_batches_respect_capacity() {
        let harness = TestHarness::new().await;

        let mut batches = Vec::new();
        for batch in 0..4 {
            let mut files = Vec::new();
            for i in 0..5 {
                files.push(staged_pdf(&harness.staging, &format!("b{batch}-{i}.pdf")).await);
            }
            batches.push(files);
        }

        let engine = &harness.engine;
        let claim_id = harness.claim_id;
        let actor = harness.owner();

        let reports = futures::future::join_all(
            batches
                .into_iter()
                .map(|files| engine.ingest(claim_id, actor, files)),
        )
        .await;

        let accepted: usize = reports.iter().map(|r| r.as_ref().unwrap().accepted()).sum();
        assert_eq!(accepted, 15);
        assert_eq!(harness.index.document_count(claim_id), 15);
        assert_eq!(harness.blobs.object_count(), 15);
        assert!(harness.staging_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_compensates_row() {
        let harness = TestHarness::new().await;
        harness.blobs.poison(b"bad bytes");

        let good = harness
            .staging
            .stage("good.pdf", "application/pdf", b"fine bytes")
            .await
            .unwrap();
        let bad = harness
            .staging
            .stage("bad.pdf", "application/pdf", b"bad bytes")
            .await
            .unwrap();

        let report = harness
            .engine
            .ingest(harness.claim_id, harness.owner(), vec![good, bad])
            .await
            .unwrap();

        assert_eq!(report.accepted(), 1);
        assert_eq!(report.rejected(), 1);

        // The failed file left neither a row nor an object behind.
        assert_eq!(harness.index.document_count(harness.claim_id), 1);
        assert_eq!(harness.blobs.object_count(), 1);
        assert!(harness.staging_empty());

        let rejected = report
            .outcomes
            .iter()
            .find(|o| !o.is_accepted())
            .unwrap();
        assert!(matches!(
            rejected,
            FileOutcome::Rejected {
                original_name,
                reason: RejectReason::StoreUnavailable,
            } if original_name == "bad.pdf"
        ));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_upload() {
        let harness = TestHarness::new().await;

        let file = staged_pdf(&harness.staging, "doc.pdf").await;
        let err = harness
            .engine
            .ingest(harness.claim_id, harness.other_holder(), vec![file])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));

        // Assessors may read everything but may not upload.
        let file = staged_pdf(&harness.staging, "doc.pdf").await;
        let err = harness
            .engine
            .ingest(harness.claim_id, harness.assessor(), vec![file])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));

        assert_eq!(harness.index.document_count(harness.claim_id), 0);
        assert_eq!(harness.blobs.object_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_claim() {
        let harness = TestHarness::new().await;

        let file = staged_pdf(&harness.staging, "doc.pdf").await;
        let err = harness
            .engine
            .ingest(Uuid::new_v4(), harness.owner(), vec![file])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_image_uploads_recorded_as_scans() {
        let harness = TestHarness::new().await;

        let file = harness
            .staging
            .stage("receipt.jpg", "image/jpeg", b"jpeg bytes")
            .await
            .unwrap();

        let report = harness
            .engine
            .ingest(harness.claim_id, harness.owner(), vec![file])
            .await
            .unwrap();

        let id = report.accepted_ids()[0];
        let document = harness.index.get(id).unwrap();
        assert_eq!(document.kind, DocumentKind::Scan);
        assert!(document.object_key.starts_with("documents/scan-"));
        assert!(document.object_key.ends_with(".jpg"));
        assert_eq!(document.original_name, "receipt.jpg");
        assert!(!document.object_key.contains("receipt"));
    }
}
