//! Collaborator interfaces of the engine.
//!
//! The engine talks to exactly two external stores: the metadata repository
//! ([`DocumentIndex`]) and the object store ([`BlobStore`]). Both are traits
//! so orchestration logic can be exercised against in-memory
//! implementations.

mod postgres;
mod remote;

use std::future::Future;
use std::path::Path;

use bytes::Bytes;
use uuid::Uuid;

use claimvault_postgres::model::{Document, NewDocument};
use claimvault_postgres::query::CapacityCheckedInsert;

pub use remote::{RemoteBlobStore, RemoteBlobStoreConfig};

use crate::error::EngineResult;

/// Metadata repository for claim documents.
///
/// Rows are the source of truth for which documents exist; the capacity
/// invariant is enforced here, atomically with row creation.
pub trait DocumentIndex: Clone + Send + Sync + 'static {
    /// Resolves the account that owns a claim.
    fn claim_owner(&self, claim_id: Uuid) -> impl Future<Output = EngineResult<Option<Uuid>>> + Send;

    /// Creates a document row if the claim stays within `limit` documents.
    ///
    /// The count and the insert must be atomic with respect to concurrent
    /// calls for the same claim.
    fn create_within_limit(
        &self,
        new_document: NewDocument,
        limit: i64,
    ) -> impl Future<Output = EngineResult<CapacityCheckedInsert>> + Send;

    /// Finds a document row.
    fn document(
        &self,
        document_id: Uuid,
    ) -> impl Future<Output = EngineResult<Option<Document>>> + Send;

    /// Lists the document rows of a claim.
    fn documents_by_claim(
        &self,
        claim_id: Uuid,
    ) -> impl Future<Output = EngineResult<Vec<Document>>> + Send;

    /// Counts the committed document rows of a claim.
    fn count_by_claim(&self, claim_id: Uuid) -> impl Future<Output = EngineResult<i64>> + Send;

    /// Deletes one document row; returns whether a row was removed.
    fn delete_document(
        &self,
        document_id: Uuid,
    ) -> impl Future<Output = EngineResult<bool>> + Send;

    /// Deletes every document row of a claim, returning the removed rows.
    fn delete_by_claim(
        &self,
        claim_id: Uuid,
    ) -> impl Future<Output = EngineResult<Vec<Document>>> + Send;
}

/// Object store holding document bytes under opaque keys.
pub trait BlobStore: Clone + Send + Sync + 'static {
    /// Stores the file at `source` under `key`.
    ///
    /// The bytes must be durable when this returns `Ok`.
    fn upload(
        &self,
        key: &str,
        content_type: &str,
        source: &Path,
        size_bytes: u64,
    ) -> impl Future<Output = EngineResult<()>> + Send;

    /// Produces a time-limited download URL for `key`.
    fn download_url(&self, key: &str) -> impl Future<Output = EngineResult<String>> + Send;

    /// Fetches the bytes stored under `key`.
    fn fetch(&self, key: &str) -> impl Future<Output = EngineResult<Bytes>> + Send;

    /// Deletes the object stored under `key`; safe to retry.
    fn delete(&self, key: &str) -> impl Future<Output = EngineResult<()>> + Send;
}
