//! Retrieval orchestration.
//!
//! Single-document reads are served as presigned URLs so bytes never proxy
//! through this service. Bulk reads stream a gzip tar archive built
//! entry-by-entry; the archive itself is never materialized in memory.

use async_compression::tokio::write::GzipEncoder;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use claimvault_postgres::model::Document;

use crate::TRACING_TARGET_RETRIEVAL;
use crate::actor::Actor;
use crate::engine::DocumentEngine;
use crate::error::{EngineError, EngineResult};
use crate::store::{BlobStore, DocumentIndex};

/// Buffer between the archive writer task and the response stream.
const ARCHIVE_BUFFER_BYTES: usize = 64 * 1024;

/// A document row paired with a fresh download URL.
#[derive(Debug, Clone)]
pub struct DocumentLink {
    /// The document record.
    pub document: Document,
    /// Presigned download URL for the document's bytes.
    pub url: String,
}

impl<I, B> DocumentEngine<I, B>
where
    I: DocumentIndex,
    B: BlobStore,
{
    /// Returns a document record with a fresh download URL.
    ///
    /// Owners read their own documents; assessors read everything.
    pub async fn document(&self, document_id: Uuid, actor: Actor) -> EngineResult<DocumentLink> {
        let Some(document) = self.index.document(document_id).await? else {
            return Err(EngineError::NotFound("document"));
        };

        if !actor.can_view(document.account_id) {
            return Err(EngineError::Unauthorized(
                "insufficient privileges to access document",
            ));
        }

        let url = self.blobs.download_url(&document.object_key).await?;

        Ok(DocumentLink { document, url })
    }

    /// Returns a fresh download URL for a document.
    pub async fn document_url(&self, document_id: Uuid, actor: Actor) -> EngineResult<String> {
        Ok(self.document(document_id, actor).await?.url)
    }

    /// Returns every document of a claim, each with a fresh download URL.
    pub async fn claim_documents(
        &self,
        claim_id: Uuid,
        actor: Actor,
    ) -> EngineResult<Vec<DocumentLink>> {
        let documents = self.authorized_claim_documents(claim_id, actor).await?;

        let links = futures::future::try_join_all(documents.into_iter().map(|document| {
            let blobs = self.blobs.clone();
            async move {
                let url = blobs.download_url(&document.object_key).await?;
                Ok::<_, EngineError>(DocumentLink { document, url })
            }
        }))
        .await?;

        Ok(links)
    }

    /// Returns the number of documents committed to a claim.
    pub async fn document_count(&self, claim_id: Uuid, actor: Actor) -> EngineResult<i64> {
        self.authorize_claim_read(claim_id, actor).await?;
        self.index.count_by_claim(claim_id).await
    }

    /// Streams every document of a claim as one gzip tar archive.
    ///
    /// Entries are named by the original filename, never the object key,
    /// and fetched one at a time while the archive streams out.
    pub async fn claim_archive(
        &self,
        claim_id: Uuid,
        actor: Actor,
    ) -> EngineResult<ReaderStream<DuplexStream>> {
        let documents = self.authorized_claim_documents(claim_id, actor).await?;

        tracing::info!(
            target: TRACING_TARGET_RETRIEVAL,
            claim_id = %claim_id,
            documents = documents.len(),
            "Streaming claim archive"
        );

        let (writer, reader) = tokio::io::duplex(ARCHIVE_BUFFER_BYTES);
        let blobs = self.blobs.clone();

        tokio::spawn(async move {
            if let Err(err) = write_archive(blobs, documents, writer).await {
                tracing::warn!(
                    target: TRACING_TARGET_RETRIEVAL,
                    claim_id = %claim_id,
                    error = %err,
                    "Archive stream aborted"
                );
            }
        });

        Ok(ReaderStream::new(reader))
    }

    /// Authorizes a claim-level read and returns the claim's documents.
    async fn authorized_claim_documents(
        &self,
        claim_id: Uuid,
        actor: Actor,
    ) -> EngineResult<Vec<Document>> {
        self.authorize_claim_read(claim_id, actor).await?;
        self.index.documents_by_claim(claim_id).await
    }

    /// Verifies the actor may read documents of the claim.
    async fn authorize_claim_read(&self, claim_id: Uuid, actor: Actor) -> EngineResult<Uuid> {
        let Some(owner) = self.index.claim_owner(claim_id).await? else {
            return Err(EngineError::NotFound("claim"));
        };

        if !actor.can_view(owner) {
            return Err(EngineError::Unauthorized(
                "insufficient permission to access documents",
            ));
        }

        Ok(owner)
    }
}

/// Appends every document to a fresh tar stream, then closes both layers.
async fn write_archive<B: BlobStore>(
    blobs: B,
    documents: Vec<Document>,
    writer: DuplexStream,
) -> EngineResult<()> {
    let encoder = GzipEncoder::new(writer);
    let mut archive = tokio_tar::Builder::new(encoder);
    let built_at = jiff::Timestamp::now().as_second().max(0) as u64;

    for document in documents {
        let bytes = blobs.fetch(&document.object_key).await?;

        let mut header = tokio_tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(built_at);
        header.set_cksum();

        archive
            .append_data(&mut header, document.original_name.as_str(), bytes.as_ref())
            .await?;
    }

    let mut encoder = archive.into_inner().await?;
    encoder.shutdown().await?;

    Ok(())
}
