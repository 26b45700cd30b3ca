//! Claim model for PostgreSQL database operations.

use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::claims;

/// Claim model, restricted to the columns the document layer reads.
///
/// Claims are owned by the claims subsystem; this layer only resolves the
/// owning account and anchors the per-claim document capacity check.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = claims)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Claim {
    /// Unique claim identifier
    pub id: Uuid,
    /// Account that owns the claim
    pub account_id: Uuid,
    /// Timestamp when the claim was created
    pub created_at: jiff_diesel::Timestamp,
}

/// Data for creating a new claim record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = claims)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewClaim {
    /// Claim ID, assigned by the claims subsystem
    pub id: Uuid,
    /// Owning account
    pub account_id: Uuid,
}

impl Claim {
    /// Returns whether the given account owns this claim.
    #[inline]
    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.account_id == account_id
    }
}
