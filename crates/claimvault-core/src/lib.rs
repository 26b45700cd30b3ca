#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for staging operations.
pub const TRACING_TARGET: &str = "claimvault_core";

/// Upper bound on the number of documents attached to a single claim.
pub const MAX_DOCUMENTS_PER_CLAIM: i64 = 15;

/// Upper bound on the size of a single uploaded file, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 3 * 1024 * 1024;

mod error;
mod media;

pub mod fs;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use media::MediaType;
