//! Metadata repository backed by PostgreSQL.

use uuid::Uuid;

use claimvault_postgres::PgClient;
use claimvault_postgres::model::{Document, NewDocument};
use claimvault_postgres::query::{CapacityCheckedInsert, ClaimRepository, DocumentRepository};

use super::DocumentIndex;
use crate::error::EngineResult;

impl DocumentIndex for PgClient {
    async fn claim_owner(&self, claim_id: Uuid) -> EngineResult<Option<Uuid>> {
        Ok(self.find_claim_owner(claim_id).await?)
    }

    async fn create_within_limit(
        &self,
        new_document: NewDocument,
        limit: i64,
    ) -> EngineResult<CapacityCheckedInsert> {
        Ok(self
            .create_document_within_limit(new_document, limit)
            .await?)
    }

    async fn document(&self, document_id: Uuid) -> EngineResult<Option<Document>> {
        Ok(self.find_document_by_id(document_id).await?)
    }

    async fn documents_by_claim(&self, claim_id: Uuid) -> EngineResult<Vec<Document>> {
        Ok(self.list_claim_documents(claim_id).await?)
    }

    async fn count_by_claim(&self, claim_id: Uuid) -> EngineResult<i64> {
        Ok(self.count_claim_documents(claim_id).await?)
    }

    async fn delete_document(&self, document_id: Uuid) -> EngineResult<bool> {
        Ok(DocumentRepository::delete_document(self, document_id).await?)
    }

    async fn delete_by_claim(&self, claim_id: Uuid) -> EngineResult<Vec<Document>> {
        Ok(self.delete_claim_documents(claim_id).await?)
    }
}
