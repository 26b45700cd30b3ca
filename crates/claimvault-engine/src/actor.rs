//! Acting identities and their access rules.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Role an authenticated actor holds.
///
/// The transport layer verifies the auth token and hands the engine the
/// resulting identity; the engine only applies the access rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumString)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    /// Holds policies and submits documents against their own claims.
    PolicyHolder,
    /// Reviews documents across all claims regardless of ownership.
    ClaimAssessor,
}

/// An authenticated actor performing a document operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct Actor {
    /// Account the actor is authenticated as.
    pub account_id: Uuid,
    /// Role attached to the account.
    pub role: ActorRole,
}

impl Actor {
    /// Creates a new actor.
    pub fn new(account_id: Uuid, role: ActorRole) -> Self {
        Self { account_id, role }
    }

    /// Creates a policy holder actor.
    pub fn policy_holder(account_id: Uuid) -> Self {
        Self::new(account_id, ActorRole::PolicyHolder)
    }

    /// Creates a claim assessor actor.
    pub fn assessor(account_id: Uuid) -> Self {
        Self::new(account_id, ActorRole::ClaimAssessor)
    }

    /// Returns whether the actor holds the assessor capability.
    #[inline]
    pub fn is_assessor(&self) -> bool {
        matches!(self.role, ActorRole::ClaimAssessor)
    }

    /// Returns whether the actor is the given owner.
    #[inline]
    pub fn owns(&self, owner_account_id: Uuid) -> bool {
        self.account_id == owner_account_id
    }

    /// Returns whether the actor may read resources owned by the given account.
    ///
    /// Owners read their own resources; assessors read everything.
    #[inline]
    pub fn can_view(&self, owner_account_id: Uuid) -> bool {
        self.owns(owner_account_id) || self.is_assessor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_rules() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let holder = Actor::policy_holder(owner);
        assert!(holder.owns(owner));
        assert!(holder.can_view(owner));
        assert!(!holder.can_view(other));

        let assessor = Actor::assessor(other);
        assert!(!assessor.owns(owner));
        assert!(assessor.can_view(owner));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&ActorRole::ClaimAssessor).unwrap(),
            "\"CLAIM_ASSESSOR\""
        );
        assert_eq!(ActorRole::PolicyHolder.to_string(), "POLICY_HOLDER");
    }
}
