//! Storage backend implementation.

use std::time::Duration;

use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::{BackendType, StorageConfig};
use crate::error::{StorageError, StorageResult};

/// Unified storage backend that wraps OpenDAL operators.
///
/// Holds no state beyond the operator itself; every call is independent and
/// `delete` is safe to retry.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: StorageConfig,
}

impl StorageBackend {
    /// Creates a new storage backend from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = config.backend_name(),
            root = %config.root(),
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the backend type.
    pub fn backend_type(&self) -> BackendType {
        self.config.backend_type()
    }

    /// Reads an object from storage.
    pub async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Reading object"
        );

        let data = self.operator.read(path).await?.to_vec();

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "Object read complete"
        );

        Ok(data)
    }

    /// Deletes an object from storage.
    ///
    /// Deleting a missing object succeeds, which makes retries safe.
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Deleting object"
        );

        match self.operator.delete(path).await {
            Ok(()) => {}
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Object deleted"
        );

        Ok(())
    }

    /// Checks if an object exists.
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.operator.exists(path).await?)
    }

    /// Produces a presigned upload request for one object key.
    ///
    /// The URL is bound to the given content type and expires after `ttl`;
    /// uploads sent later are refused by the store.
    pub async fn presign_upload(
        &self,
        path: &str,
        content_type: &str,
        ttl: Duration,
    ) -> StorageResult<SignedRequest> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            content_type = %content_type,
            ttl_secs = ttl.as_secs(),
            "Presigning upload"
        );

        let request = self
            .operator
            .presign_write_with(path, ttl)
            .content_type(content_type)
            .await?;

        Ok(SignedRequest::from_presigned(&request, ttl))
    }

    /// Produces a presigned download URL for one object key.
    pub async fn presign_download(&self, path: &str, ttl: Duration) -> StorageResult<SignedRequest> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            ttl_secs = ttl.as_secs(),
            "Presigning download"
        );

        let request = self.operator.presign_read(path, ttl).await?;

        Ok(SignedRequest::from_presigned(&request, ttl))
    }

    /// Creates an OpenDAL operator based on configuration.
    #[allow(unreachable_patterns)]
    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        match config {
            #[cfg(feature = "s3")]
            StorageConfig::S3(s3) => {
                let mut builder = services::S3::default()
                    .bucket(&s3.bucket)
                    .region(&s3.region);

                if let Some(ref endpoint) = s3.endpoint {
                    builder = builder.endpoint(endpoint);
                }

                if let Some(ref access_key_id) = s3.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }

                if let Some(ref secret_access_key) = s3.secret_access_key {
                    builder = builder.secret_access_key(secret_access_key);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            #[cfg(feature = "azblob")]
            StorageConfig::AzureBlob(azblob) => {
                let mut builder = services::Azblob::default().container(&azblob.container);

                if let Some(ref account_name) = azblob.account_name {
                    builder = builder.account_name(account_name);
                }

                if let Some(ref account_key) = azblob.account_key {
                    builder = builder.account_key(account_key);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            // This should never be reached if the config was properly created
            // with the same features enabled
            #[allow(unreachable_patterns)]
            _ => Err(StorageError::init(format!(
                "Backend type {:?} is not supported with current features",
                config.backend_type()
            ))),
        }
    }
}

/// A presigned request against the object store.
///
/// Capability-bearing: whoever holds the URL can perform exactly one class
/// of access on one key until the request expires.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method the store expects.
    pub method: String,
    /// Fully signed request URL.
    pub uri: String,
    /// Headers that must accompany the request.
    pub headers: Vec<(String, String)>,
    /// Validity window the request was signed for.
    pub expires_in: Duration,
}

impl SignedRequest {
    fn from_presigned(request: &opendal::raw::PresignedRequest, ttl: Duration) -> Self {
        let headers = request
            .header()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            method: request.method().as_str().to_owned(),
            uri: request.uri().to_string(),
            headers,
            expires_in: ttl,
        }
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("backend_type", &self.config.backend_type())
            .field("root", &self.config.root())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "s3")]
    #[tokio::test]
    async fn test_backend_from_s3_config() {
        use super::*;
        use crate::S3Config;

        let config = StorageConfig::S3(
            S3Config::new("claim-documents", "us-east-1")
                .with_credentials("access", "secret"),
        );

        let backend = StorageBackend::new(config).await.unwrap();
        assert_eq!(backend.backend_type(), BackendType::S3);
        assert_eq!(backend.config().root(), "claim-documents");
    }
}
