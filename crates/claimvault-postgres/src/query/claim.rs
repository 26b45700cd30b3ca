//! Claim repository for resolving claim ownership.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Claim, NewClaim};
use crate::{PgClient, PgError, PgResult, schema};

/// Repository for claim database operations.
///
/// The claims subsystem owns the claim lifecycle; the document layer only
/// needs to create rows on its behalf (tests, backfills) and resolve
/// ownership for authorization.
pub trait ClaimRepository {
    /// Creates a new claim record.
    fn create_claim(&self, new_claim: NewClaim) -> impl Future<Output = PgResult<Claim>> + Send;

    /// Finds a claim by its unique identifier.
    fn find_claim_by_id(
        &self,
        claim_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Claim>>> + Send;

    /// Resolves the account that owns a claim.
    fn find_claim_owner(
        &self,
        claim_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Uuid>>> + Send;
}

impl ClaimRepository for PgClient {
    async fn create_claim(&self, new_claim: NewClaim) -> PgResult<Claim> {
        let mut conn = self.get_connection().await?;

        use schema::claims;

        let claim = diesel::insert_into(claims::table)
            .values(&new_claim)
            .returning(Claim::as_returning())
            .get_result(&mut *conn)
            .await
            .map_err(PgError::from)?;

        Ok(claim)
    }

    async fn find_claim_by_id(&self, claim_id: Uuid) -> PgResult<Option<Claim>> {
        let mut conn = self.get_connection().await?;

        use schema::claims::{self, dsl};

        let claim = claims::table
            .filter(dsl::id.eq(claim_id))
            .select(Claim::as_select())
            .first(&mut *conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(claim)
    }

    async fn find_claim_owner(&self, claim_id: Uuid) -> PgResult<Option<Uuid>> {
        let mut conn = self.get_connection().await?;

        use schema::claims::{self, dsl};

        let owner = claims::table
            .filter(dsl::id.eq(claim_id))
            .select(dsl::account_id)
            .first(&mut *conn)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(owner)
    }
}
