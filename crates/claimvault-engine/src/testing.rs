//! In-memory collaborator implementations for orchestration tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tempfile::TempDir;
use uuid::Uuid;

use claimvault_core::fs::{StagedFile, StagingArea};
use claimvault_postgres::model::{Document, NewDocument};
use claimvault_postgres::query::CapacityCheckedInsert;
use claimvault_postgres::types::DocumentKind;

use crate::actor::Actor;
use crate::engine::DocumentEngine;
use crate::error::{EngineError, EngineResult};
use crate::store::{BlobStore, DocumentIndex};

/// In-memory metadata repository.
///
/// The capacity-checked insert holds the state lock across count and
/// insert, matching the atomicity the Postgres implementation gets from
/// its transaction.
#[derive(Clone, Default)]
pub struct MemoryIndex {
    inner: Arc<Mutex<IndexState>>,
}

#[derive(Default)]
struct IndexState {
    claims: HashMap<Uuid, Uuid>,
    documents: Vec<Document>,
}

impl MemoryIndex {
    /// Creates an index holding one claim.
    pub fn with_claim(claim_id: Uuid, owner: Uuid) -> Self {
        let index = Self::default();
        index.insert_claim(claim_id, owner);
        index
    }

    /// Registers a claim with its owner.
    pub fn insert_claim(&self, claim_id: Uuid, owner: Uuid) {
        self.inner.lock().unwrap().claims.insert(claim_id, owner);
    }

    /// Returns the committed document count of a claim.
    pub fn document_count(&self, claim_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|d| d.claim_id == claim_id)
            .count()
    }

    /// Returns a document by id.
    pub fn get(&self, document_id: Uuid) -> Option<Document> {
        self.inner
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.id == document_id)
            .cloned()
    }

    /// Inserts `count` placeholder documents into a claim.
    pub fn seed_documents(&self, claim_id: Uuid, account_id: Uuid, count: usize) {
        let mut state = self.inner.lock().unwrap();
        for _ in 0..count {
            let id = Uuid::now_v7();
            state.documents.push(Document {
                id,
                claim_id,
                account_id,
                object_key: format!("documents/text-{}.pdf", id.simple()),
                original_name: "seeded.pdf".into(),
                kind: DocumentKind::Text,
                content_type: "application/pdf".into(),
                size_bytes: 1,
                created_at: jiff::Timestamp::now().into(),
            });
        }
    }
}

impl DocumentIndex for MemoryIndex {
    async fn claim_owner(&self, claim_id: Uuid) -> EngineResult<Option<Uuid>> {
        Ok(self.inner.lock().unwrap().claims.get(&claim_id).copied())
    }

    async fn create_within_limit(
        &self,
        new_document: NewDocument,
        limit: i64,
    ) -> EngineResult<CapacityCheckedInsert> {
        let mut state = self.inner.lock().unwrap();

        if !state.claims.contains_key(&new_document.claim_id) {
            return Ok(CapacityCheckedInsert::ClaimMissing);
        }

        let committed = state
            .documents
            .iter()
            .filter(|d| d.claim_id == new_document.claim_id)
            .count() as i64;

        if committed + 1 > limit {
            return Ok(CapacityCheckedInsert::LimitReached { committed });
        }

        let document = Document {
            id: Uuid::now_v7(),
            claim_id: new_document.claim_id,
            account_id: new_document.account_id,
            object_key: new_document.object_key,
            original_name: new_document.original_name,
            kind: new_document.kind,
            content_type: new_document.content_type,
            size_bytes: new_document.size_bytes,
            created_at: jiff::Timestamp::now().into(),
        };
        state.documents.push(document.clone());

        Ok(CapacityCheckedInsert::Created(document))
    }

    async fn document(&self, document_id: Uuid) -> EngineResult<Option<Document>> {
        Ok(self.get(document_id))
    }

    async fn documents_by_claim(&self, claim_id: Uuid) -> EngineResult<Vec<Document>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|d| d.claim_id == claim_id)
            .cloned()
            .collect())
    }

    async fn count_by_claim(&self, claim_id: Uuid) -> EngineResult<i64> {
        Ok(self.document_count(claim_id) as i64)
    }

    async fn delete_document(&self, document_id: Uuid) -> EngineResult<bool> {
        let mut state = self.inner.lock().unwrap();
        let before = state.documents.len();
        state.documents.retain(|d| d.id != document_id);
        Ok(state.documents.len() < before)
    }

    async fn delete_by_claim(&self, claim_id: Uuid) -> EngineResult<Vec<Document>> {
        let mut state = self.inner.lock().unwrap();
        let (removed, kept) = std::mem::take(&mut state.documents)
            .into_iter()
            .partition(|d| d.claim_id == claim_id);
        state.documents = kept;
        Ok(removed)
    }
}

/// In-memory blob store with failure injection.
#[derive(Clone, Default)]
pub struct MemoryBlobs {
    inner: Arc<Mutex<BlobState>>,
}

#[derive(Default)]
struct BlobState {
    objects: HashMap<String, Vec<u8>>,
    poison: Option<Vec<u8>>,
    fail_delete: HashSet<String>,
}

impl MemoryBlobs {
    /// Makes every upload of exactly these bytes fail.
    pub fn poison(&self, bytes: &[u8]) {
        self.inner.lock().unwrap().poison = Some(bytes.to_vec());
    }

    /// Makes deletion of the given key fail.
    pub fn fail_delete(&self, key: &str) {
        self.inner.lock().unwrap().fail_delete.insert(key.to_owned());
    }

    /// Returns the number of stored objects.
    pub fn object_count(&self) -> usize {
        self.inner.lock().unwrap().objects.len()
    }

    /// Returns the stored object keys, sorted.
    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.inner.lock().unwrap().objects.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryBlobs {
    async fn upload(
        &self,
        key: &str,
        _content_type: &str,
        source: &Path,
        size_bytes: u64,
    ) -> EngineResult<()> {
        let bytes = tokio::fs::read(source).await?;
        if bytes.len() as u64 != size_bytes {
            return Err(EngineError::Internal("staged size mismatch".into()));
        }

        let mut state = self.inner.lock().unwrap();
        if state.poison.as_deref() == Some(bytes.as_slice()) {
            return Err(EngineError::StoreUnavailable("injected upload failure".into()));
        }

        state.objects.insert(key.to_owned(), bytes);
        Ok(())
    }

    async fn download_url(&self, key: &str) -> EngineResult<String> {
        Ok(format!("https://blobs.test/{key}?sig=test"))
    }

    async fn fetch(&self, key: &str) -> EngineResult<Bytes> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(key)
            .map(|bytes| Bytes::from(bytes.clone()))
            .ok_or(EngineError::NotFound("document bytes"))
    }

    async fn delete(&self, key: &str) -> EngineResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_delete.contains(key) {
            return Err(EngineError::StoreUnavailable("injected delete failure".into()));
        }

        state.objects.remove(key);
        Ok(())
    }
}

/// One engine over fresh in-memory stores and a temp staging directory.
pub struct TestHarness {
    pub engine: DocumentEngine<MemoryIndex, MemoryBlobs>,
    pub index: MemoryIndex,
    pub blobs: MemoryBlobs,
    pub staging: StagingArea,
    pub claim_id: Uuid,
    owner_id: Uuid,
    _dir: TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let staging = StagingArea::new(dir.path());
        staging.init().await.unwrap();

        let owner_id = Uuid::new_v4();
        let claim_id = Uuid::new_v4();
        let index = MemoryIndex::with_claim(claim_id, owner_id);
        let blobs = MemoryBlobs::default();
        let engine = DocumentEngine::new(index.clone(), blobs.clone());

        Self {
            engine,
            index,
            blobs,
            staging,
            claim_id,
            owner_id,
            _dir: dir,
        }
    }

    /// The policy holder owning the harness claim.
    pub fn owner(&self) -> Actor {
        Actor::policy_holder(self.owner_id)
    }

    /// A policy holder unrelated to the harness claim.
    pub fn other_holder(&self) -> Actor {
        Actor::policy_holder(Uuid::new_v4())
    }

    /// An assessor account.
    pub fn assessor(&self) -> Actor {
        Actor::assessor(Uuid::new_v4())
    }

    /// Returns whether the staging directory holds no files.
    pub fn staging_empty(&self) -> bool {
        std::fs::read_dir(self.staging.root()).unwrap().count() == 0
    }

    /// Stages and ingests one file as the claim owner, returning its id.
    pub async fn ingest_one(&self, name: &str, content_type: &str, content: &[u8]) -> Uuid {
        let staged = self.staging.stage(name, content_type, content).await.unwrap();
        let report = self
            .engine
            .ingest(self.claim_id, self.owner(), vec![staged])
            .await
            .unwrap();
        report.accepted_ids()[0]
    }
}

/// Stages a small PDF under the given name.
pub async fn staged_pdf(staging: &StagingArea, name: &str) -> StagedFile {
    staging
        .stage(name, "application/pdf", b"pdf bytes")
        .await
        .unwrap()
}
