//! Database query repositories for the claim document tables.
//!
//! This module contains repository implementations that provide high-level
//! database operations over claims and documents, encapsulating common
//! patterns and providing type-safe interfaces.

pub mod claim;
pub mod document;

pub use claim::ClaimRepository;
pub use document::{CapacityCheckedInsert, DocumentRepository};
