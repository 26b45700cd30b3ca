//! Object store access through presigned requests.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Body, Method, StatusCode};
use tokio_util::io::ReaderStream;

use claimvault_opendal::{SignedRequest, StorageBackend, StorageError};

use super::BlobStore;
use crate::TRACING_TARGET_INGEST;
use crate::error::{EngineError, EngineResult};

/// Validity windows for presigned URLs.
#[derive(Debug, Clone, Copy)]
pub struct RemoteBlobStoreConfig {
    /// How long an upload URL stays valid. Bytes must arrive before this
    /// window closes or the store refuses them.
    pub upload_url_ttl: Duration,
    /// How long a download URL stays valid.
    pub download_url_ttl: Duration,
}

impl Default for RemoteBlobStoreConfig {
    fn default() -> Self {
        Self {
            upload_url_ttl: Duration::from_secs(2 * 60),
            download_url_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Blob store backed by a remote object store.
///
/// Writes go through a presigned PUT so the byte path matches what the
/// store enforces for browser uploads; reads for callers are served as
/// presigned URLs without proxying bytes through this service.
#[derive(Debug, Clone)]
pub struct RemoteBlobStore {
    backend: StorageBackend,
    http: reqwest::Client,
    config: RemoteBlobStoreConfig,
}

impl RemoteBlobStore {
    /// Creates a blob store with default URL validity windows.
    pub fn new(backend: StorageBackend) -> Self {
        Self::with_config(backend, RemoteBlobStoreConfig::default())
    }

    /// Creates a blob store with the given URL validity windows.
    pub fn with_config(backend: StorageBackend, config: RemoteBlobStoreConfig) -> Self {
        Self {
            backend,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Returns the configured validity windows.
    pub fn config(&self) -> &RemoteBlobStoreConfig {
        &self.config
    }

    async fn send_signed_put(
        &self,
        signed: &SignedRequest,
        source: &Path,
        size_bytes: u64,
    ) -> EngineResult<()> {
        let method = Method::from_bytes(signed.method.as_bytes())
            .map_err(|err| EngineError::Internal(format!("invalid presigned method: {err}")))?;

        let file = tokio::fs::File::open(source).await?;
        let stream = ReaderStream::new(file);

        let mut request = self.http.request(method, &signed.uri);
        for (name, value) in &signed.headers {
            request = request.header(name, value);
        }

        let response = request
            .header(reqwest::header::CONTENT_LENGTH, size_bytes)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|err| EngineError::StoreUnavailable(err.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::FORBIDDEN => Err(EngineError::UploadExpired),
            status => Err(EngineError::StoreUnavailable(format!(
                "upload returned {status}"
            ))),
        }
    }
}

impl BlobStore for RemoteBlobStore {
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        source: &Path,
        size_bytes: u64,
    ) -> EngineResult<()> {
        let signed = self
            .backend
            .presign_upload(key, content_type, self.config.upload_url_ttl)
            .await?;

        tracing::debug!(
            target: TRACING_TARGET_INGEST,
            key = %key,
            size = size_bytes,
            ttl_secs = signed.expires_in.as_secs(),
            "Streaming upload to presigned URL"
        );

        self.send_signed_put(&signed, source, size_bytes).await
    }

    async fn download_url(&self, key: &str) -> EngineResult<String> {
        let signed = self
            .backend
            .presign_download(key, self.config.download_url_ttl)
            .await?;

        Ok(signed.uri)
    }

    async fn fetch(&self, key: &str) -> EngineResult<Bytes> {
        match self.backend.read(key).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.is_not_found() => Err(EngineError::NotFound("document bytes")),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, key: &str) -> EngineResult<()> {
        match self.backend.delete(key).await {
            Ok(()) => Ok(()),
            Err(StorageError::Backend(err)) => {
                Err(EngineError::StoreUnavailable(err.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
