//! Per-claim document capacity admission.

use uuid::Uuid;

use crate::error::EngineResult;
use crate::store::DocumentIndex;

/// Result of admitting an upload batch against the capacity limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Number of files admitted for ingestion.
    pub granted: usize,
    /// Number of files declined because the claim would exceed the limit.
    pub declined: usize,
}

impl Admission {
    /// Returns whether any file was admitted.
    pub fn any_granted(&self) -> bool {
        self.granted > 0
    }
}

/// Enforces the "at most N documents per claim" invariant.
///
/// Admission is optimistic: two requests racing on the same claim can both
/// pass this check. Every admitted file is therefore re-validated at commit
/// time, inside the transaction that creates its metadata row
/// ([`DocumentIndex::create_within_limit`]), which refuses the insert that
/// would push the committed count over the limit.
#[derive(Debug, Clone, Copy)]
pub struct CapacityGuard {
    limit: i64,
}

impl CapacityGuard {
    /// Creates a guard enforcing the given per-claim limit.
    pub fn new(limit: i64) -> Self {
        Self { limit }
    }

    /// Returns the enforced per-claim limit.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Admits as many of `requested` files as the claim has free slots for.
    ///
    /// Files beyond the granted count fail with `CapacityExceeded` without
    /// touching files that were admitted.
    pub async fn reserve<I: DocumentIndex>(
        &self,
        index: &I,
        claim_id: Uuid,
        requested: usize,
    ) -> EngineResult<Admission> {
        let committed = index.count_by_claim(claim_id).await?;
        let free = usize::try_from((self.limit - committed).max(0)).unwrap_or(0);

        Ok(Admission {
            granted: requested.min(free),
            declined: requested.saturating_sub(free),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryIndex;

    #[tokio::test]
    async fn test_admission_counts() {
        let owner = Uuid::new_v4();
        let claim_id = Uuid::new_v4();
        let index = MemoryIndex::with_claim(claim_id, owner);

        let guard = CapacityGuard::new(15);

        let admission = guard.reserve(&index, claim_id, 4).await.unwrap();
        assert_eq!(admission.granted, 4);
        assert_eq!(admission.declined, 0);

        let admission = guard.reserve(&index, claim_id, 20).await.unwrap();
        assert_eq!(admission.granted, 15);
        assert_eq!(admission.declined, 5);
        assert!(admission.any_granted());
    }

    #[tokio::test]
    async fn test_admission_against_committed_rows() {
        let owner = Uuid::new_v4();
        let claim_id = Uuid::new_v4();
        let index = MemoryIndex::with_claim(claim_id, owner);
        index.seed_documents(claim_id, owner, 14);

        let guard = CapacityGuard::new(15);

        let admission = guard.reserve(&index, claim_id, 3).await.unwrap();
        assert_eq!(admission.granted, 1);
        assert_eq!(admission.declined, 2);

        index.seed_documents(claim_id, owner, 1);
        let admission = guard.reserve(&index, claim_id, 3).await.unwrap();
        assert_eq!(admission.granted, 0);
        assert!(!admission.any_granted());
    }
}
