//! Document repository for managing uploaded claim documents.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;
use uuid::Uuid;

use crate::model::{Document, NewDocument};
use crate::{PgClient, PgError, PgResult, schema};

/// Outcome of a capacity-checked document insert.
#[derive(Debug, Clone, PartialEq)]
pub enum CapacityCheckedInsert {
    /// The document was created within the limit.
    Created(Document),
    /// The claim already holds `committed` documents and the insert was refused.
    LimitReached {
        /// Number of documents committed to the claim at check time.
        committed: i64,
    },
    /// The claim does not exist.
    ClaimMissing,
}

/// Repository for document metadata operations.
///
/// Rows in `documents` are the source of truth for which documents a claim
/// has; object-store blobs follow the rows. Creation is capacity-checked
/// inside a transaction so the per-claim limit holds under concurrent
/// uploads.
pub trait DocumentRepository {
    /// Creates a document record if the claim stays within `limit` documents.
    ///
    /// The count and the insert run in one transaction that holds the claim
    /// row lock, so two concurrent inserts on the same claim serialize and
    /// the losing insert observes the winner's row.
    fn create_document_within_limit(
        &self,
        new_document: NewDocument,
        limit: i64,
    ) -> impl Future<Output = PgResult<CapacityCheckedInsert>> + Send;

    /// Finds a document by its unique identifier.
    fn find_document_by_id(
        &self,
        document_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Document>>> + Send;

    /// Lists all documents associated with a claim.
    fn list_claim_documents(
        &self,
        claim_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Document>>> + Send;

    /// Counts the documents committed to a claim.
    fn count_claim_documents(&self, claim_id: Uuid)
    -> impl Future<Output = PgResult<i64>> + Send;

    /// Deletes a document record.
    ///
    /// Returns whether a row was actually removed.
    fn delete_document(&self, document_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;

    /// Deletes every document record of a claim.
    ///
    /// Returns the deleted rows so callers can release the backing objects.
    fn delete_claim_documents(
        &self,
        claim_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Document>>> + Send;
}

impl DocumentRepository for PgClient {
    async fn create_document_within_limit(
        &self,
        new_document: NewDocument,
        limit: i64,
    ) -> PgResult<CapacityCheckedInsert> {
        let mut conn = self.get_connection().await?;

        conn.transaction(|conn| {
            async move {
                use schema::{claims, documents};

                // Lock the claim row so concurrent inserts on the same claim
                // serialize and each one counts the rows of the previous.
                let claim: Option<Uuid> = claims::table
                    .filter(claims::dsl::id.eq(new_document.claim_id))
                    .select(claims::dsl::account_id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;

                if claim.is_none() {
                    return Ok(CapacityCheckedInsert::ClaimMissing);
                }

                let committed: i64 = documents::table
                    .filter(documents::dsl::claim_id.eq(new_document.claim_id))
                    .count()
                    .get_result(conn)
                    .await?;

                if committed + 1 > limit {
                    return Ok(CapacityCheckedInsert::LimitReached { committed });
                }

                let document = diesel::insert_into(documents::table)
                    .values(&new_document)
                    .returning(Document::as_returning())
                    .get_result(conn)
                    .await?;

                Ok(CapacityCheckedInsert::Created(document))
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_document_by_id(&self, document_id: Uuid) -> PgResult<Option<Document>> {
        let mut conn = self.get_connection().await?;

        use schema::documents::{self, dsl};

        let document = documents::table
            .filter(dsl::id.eq(document_id))
            .select(Document::as_select())
            .first(&mut *conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(document)
    }

    async fn list_claim_documents(&self, claim_id: Uuid) -> PgResult<Vec<Document>> {
        let mut conn = self.get_connection().await?;

        use schema::documents::{self, dsl};

        let documents = documents::table
            .filter(dsl::claim_id.eq(claim_id))
            .order(dsl::created_at.asc())
            .select(Document::as_select())
            .load(&mut *conn)
            .await
            .map_err(PgError::from)?;

        Ok(documents)
    }

    async fn count_claim_documents(&self, claim_id: Uuid) -> PgResult<i64> {
        let mut conn = self.get_connection().await?;

        use schema::documents::{self, dsl};

        let count = documents::table
            .filter(dsl::claim_id.eq(claim_id))
            .count()
            .get_result(&mut *conn)
            .await
            .map_err(PgError::from)?;

        Ok(count)
    }

    async fn delete_document(&self, document_id: Uuid) -> PgResult<bool> {
        let mut conn = self.get_connection().await?;

        use schema::documents::{self, dsl};

        let affected = diesel::delete(documents::table.filter(dsl::id.eq(document_id)))
            .execute(&mut *conn)
            .await
            .map_err(PgError::from)?;

        Ok(affected > 0)
    }

    async fn delete_claim_documents(&self, claim_id: Uuid) -> PgResult<Vec<Document>> {
        let mut conn = self.get_connection().await?;

        use schema::documents::{self, dsl};

        let deleted = diesel::delete(documents::table.filter(dsl::claim_id.eq(claim_id)))
            .returning(Document::as_returning())
            .get_results(&mut *conn)
            .await
            .map_err(PgError::from)?;

        Ok(deleted)
    }
}
