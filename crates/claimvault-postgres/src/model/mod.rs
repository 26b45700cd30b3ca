//! Database models for the claim document tables.
//!
//! This module contains Diesel model definitions for the tables this layer
//! owns, including structs for querying and inserting records.

mod claim;
mod document;

pub use claim::{Claim, NewClaim};
pub use document::{Document, NewDocument};
