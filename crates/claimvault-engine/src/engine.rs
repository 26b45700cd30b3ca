//! Engine facade and configuration.

use claimvault_core::MAX_DOCUMENTS_PER_CLAIM;

use crate::capacity::CapacityGuard;
use crate::store::{BlobStore, DocumentIndex};

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Maximum number of documents one claim may hold.
    pub max_documents_per_claim: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_documents_per_claim: MAX_DOCUMENTS_PER_CLAIM,
        }
    }
}

/// The document lifecycle engine.
///
/// Owns the orchestration of ingestion, retrieval and deletion over the two
/// stores. The transport layer constructs one engine and calls it per
/// request; the engine itself is cheap to clone.
#[derive(Debug, Clone)]
pub struct DocumentEngine<I, B> {
    pub(crate) index: I,
    pub(crate) blobs: B,
    pub(crate) guard: CapacityGuard,
}

impl<I, B> DocumentEngine<I, B>
where
    I: DocumentIndex,
    B: BlobStore,
{
    /// Creates an engine with the default configuration.
    pub fn new(index: I, blobs: B) -> Self {
        Self::with_config(index, blobs, EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(index: I, blobs: B, config: EngineConfig) -> Self {
        Self {
            index,
            blobs,
            guard: CapacityGuard::new(config.max_documents_per_claim),
        }
    }

    /// Returns the metadata repository.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Returns the blob store.
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Returns the capacity guard.
    pub fn capacity(&self) -> &CapacityGuard {
        &self.guard
    }
}
