//! Deletion orchestration.
//!
//! Metadata is deleted first and is authoritative; blob deletion follows
//! and its failures never roll the metadata back. A blob whose deletion
//! failed is unreachable once its key is gone from the metadata store, so
//! orphans are logged for out-of-band reconciliation instead of retried
//! inline.

use serde::Serialize;
use uuid::Uuid;

use crate::TRACING_TARGET_DELETION;
use crate::actor::Actor;
use crate::engine::DocumentEngine;
use crate::error::{EngineError, EngineResult};
use crate::store::{BlobStore, DocumentIndex};

/// Result of a claim-wide document deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    /// Number of document rows removed.
    pub deleted_documents: usize,
    /// Number of backing objects whose deletion failed and was logged.
    pub failed_blobs: usize,
}

impl<I, B> DocumentEngine<I, B>
where
    I: DocumentIndex,
    B: BlobStore,
{
    /// Deletes one document and its backing object.
    ///
    /// Only the uploading account may delete a document. The metadata row
    /// goes first; a blob deletion failure is logged and the call still
    /// succeeds.
    pub async fn delete_document(&self, document_id: Uuid, actor: Actor) -> EngineResult<()> {
        let Some(document) = self.index.document(document_id).await? else {
            return Err(EngineError::NotFound("document"));
        };

        if !actor.owns(document.account_id) {
            return Err(EngineError::Unauthorized(
                "cannot delete a document you do not own",
            ));
        }

        let removed = self.index.delete_document(document.id).await?;
        if !removed {
            // A concurrent deletion got there first.
            return Err(EngineError::NotFound("document"));
        }

        if let Err(err) = self.blobs.delete(&document.object_key).await {
            tracing::warn!(
                target: TRACING_TARGET_DELETION,
                document_id = %document.id,
                object_key = %document.object_key,
                error = %err,
                "Blob deletion failed, object orphaned"
            );
        }

        tracing::info!(
            target: TRACING_TARGET_DELETION,
            document_id = %document.id,
            claim_id = %document.claim_id,
            "Document deleted"
        );

        Ok(())
    }

    /// Deletes every document of a claim and their backing objects.
    ///
    /// Only the claim owner may bulk-delete. All rows are removed first,
    /// then the objects are deleted concurrently; individual failures are
    /// collected into the report without affecting the metadata deletion.
    pub async fn delete_claim_documents(
        &self,
        claim_id: Uuid,
        actor: Actor,
    ) -> EngineResult<BulkDeleteReport> {
        let Some(owner) = self.index.claim_owner(claim_id).await? else {
            return Err(EngineError::NotFound("claim"));
        };

        if !actor.owns(owner) {
            return Err(EngineError::Unauthorized(
                "cannot delete documents of a claim you do not own",
            ));
        }

        let removed = self.index.delete_by_claim(claim_id).await?;

        let deletions = futures::future::join_all(removed.iter().map(|document| {
            let blobs = self.blobs.clone();
            async move {
                blobs
                    .delete(&document.object_key)
                    .await
                    .map_err(|err| (document.id, document.object_key.as_str(), err))
            }
        }))
        .await;

        let mut failed_blobs = 0;
        for deletion in deletions {
            if let Err((document_id, object_key, err)) = deletion {
                failed_blobs += 1;
                tracing::warn!(
                    target: TRACING_TARGET_DELETION,
                    document_id = %document_id,
                    object_key = %object_key,
                    error = %err,
                    "Blob deletion failed, object orphaned"
                );
            }
        }

        tracing::info!(
            target: TRACING_TARGET_DELETION,
            claim_id = %claim_id,
            deleted = removed.len(),
            failed_blobs,
            "Claim documents deleted"
        );

        Ok(BulkDeleteReport {
            deleted_documents: removed.len(),
            failed_blobs,
        })
    }
}
