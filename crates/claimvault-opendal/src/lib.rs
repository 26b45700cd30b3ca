#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod config;
mod error;

#[cfg(feature = "azblob")]
mod azblob;
#[cfg(feature = "s3")]
mod s3;

pub use backend::{SignedRequest, StorageBackend};
pub use config::{BackendType, StorageConfig};
pub use error::{StorageError, StorageResult};

#[cfg(feature = "azblob")]
pub use azblob::AzureBlobConfig;
#[cfg(feature = "s3")]
pub use s3::S3Config;

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "claimvault_opendal";
