//! Staging area for uploads awaiting durable storage.
//!
//! Files received by the transport layer are held here, on local disk under
//! opaque generated names, until the ingestion path either persists them to
//! the object store or rejects them. Staged files are removed on every exit
//! path.

mod staged_file;

pub use staged_file::{StagedFile, StagingArea};
