//! Storage configuration types.

use serde::{Deserialize, Serialize};

#[cfg(feature = "azblob")]
pub use crate::azblob::AzureBlobConfig;
#[cfg(feature = "s3")]
pub use crate::s3::S3Config;

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum StorageConfig {
    /// Amazon S3 compatible storage.
    #[cfg(feature = "s3")]
    S3(S3Config),
    /// Azure Blob Storage.
    #[cfg(feature = "azblob")]
    AzureBlob(AzureBlobConfig),
}

impl StorageConfig {
    /// Returns the backend type.
    pub fn backend_type(&self) -> BackendType {
        match self {
            #[cfg(feature = "s3")]
            Self::S3(_) => BackendType::S3,
            #[cfg(feature = "azblob")]
            Self::AzureBlob(_) => BackendType::AzureBlob,
        }
    }

    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        self.backend_type().as_str()
    }

    /// Returns the bucket or container the backend writes into.
    pub fn root(&self) -> &str {
        match self {
            #[cfg(feature = "s3")]
            Self::S3(config) => &config.bucket,
            #[cfg(feature = "azblob")]
            Self::AzureBlob(config) => &config.container,
        }
    }
}

/// Supported storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum BackendType {
    /// Amazon S3 compatible storage.
    S3,
    /// Azure Blob Storage.
    AzureBlob,
}

impl BackendType {
    /// Returns the backend name as a static string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::AzureBlob => "azblob",
        }
    }
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "s3")]
    #[test]
    fn test_backend_name() {
        use super::*;

        let config = StorageConfig::S3(S3Config::new("claim-documents", "us-east-1"));
        assert_eq!(config.backend_name(), "s3");
        assert_eq!(config.root(), "claim-documents");
    }

    #[cfg(feature = "s3")]
    #[test]
    fn test_serde_tagging() {
        use super::*;

        let config = StorageConfig::S3(S3Config::new("claim-documents", "us-east-1"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"type\":\"s3\""));

        let parsed: StorageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
