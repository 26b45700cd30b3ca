#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for ingestion operations.
pub const TRACING_TARGET_INGEST: &str = "claimvault_engine::ingest";

/// Tracing target for retrieval operations.
pub const TRACING_TARGET_RETRIEVAL: &str = "claimvault_engine::retrieval";

/// Tracing target for deletion operations.
pub const TRACING_TARGET_DELETION: &str = "claimvault_engine::deletion";

mod actor;
mod capacity;
mod deletion;
mod engine;
mod error;
mod ingest;
mod retrieval;

pub mod store;

#[cfg(test)]
mod testing;

pub use actor::{Actor, ActorRole};
pub use capacity::{Admission, CapacityGuard};
pub use deletion::BulkDeleteReport;
pub use engine::{DocumentEngine, EngineConfig};
pub use error::{EngineError, EngineResult, RejectReason};
pub use ingest::{FileOutcome, IngestReport};
pub use retrieval::DocumentLink;
