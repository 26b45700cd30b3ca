//! Staged upload handling.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::media::MediaType;
use crate::{MAX_UPLOAD_BYTES, TRACING_TARGET};

/// A directory that holds uploads between receipt and durable storage.
///
/// Staged names are derived from the media type and a generated identifier,
/// never from caller-supplied input.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Creates a staging area rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the staging directory if it does not exist yet.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            root = %self.root.display(),
            "Staging area initialized"
        );

        Ok(())
    }

    /// Returns the staging root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stages raw upload content.
    ///
    /// Validation happens before anything touches the disk: unknown media
    /// types fail with `UnsupportedMediaType` and payloads over the size
    /// limit with `FileTooLarge`.
    pub async fn stage(
        &self,
        original_name: &str,
        content_type: &str,
        content: &[u8],
    ) -> Result<StagedFile> {
        let media_type = validate(content_type, content.len() as u64)?;

        let path = self.root.join(opaque_name(media_type));
        tokio::fs::write(&path, content).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            size = content.len(),
            "Upload staged"
        );

        Ok(StagedFile {
            path,
            media_type,
            size_bytes: content.len() as u64,
            original_name: original_name.to_owned(),
            removed: false,
        })
    }

    /// Takes ownership of a file the transport layer already wrote to disk.
    ///
    /// The file is validated against the same rules as [`stage`] and removed
    /// immediately when it fails them.
    ///
    /// [`stage`]: StagingArea::stage
    pub async fn adopt(
        &self,
        path: impl Into<PathBuf>,
        original_name: &str,
        content_type: &str,
    ) -> Result<StagedFile> {
        let path = path.into();

        let size_bytes = tokio::fs::metadata(&path).await?.len();
        if let Err(err) = validate(content_type, size_bytes) {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    path = %path.display(),
                    error = %remove_err,
                    "Failed to remove rejected upload"
                );
            }
            return Err(err);
        }

        // Infallible after validate.
        let media_type = MediaType::from_mime(content_type).ok_or_else(Error::internal)?;

        Ok(StagedFile {
            path,
            media_type,
            size_bytes,
            original_name: original_name.to_owned(),
            removed: false,
        })
    }
}

/// Validates the declared media type and content size.
fn validate(content_type: &str, size_bytes: u64) -> Result<MediaType> {
    let Some(media_type) = MediaType::from_mime(content_type) else {
        return Err(Error::unsupported_media_type().with_message(content_type));
    };

    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(Error::file_too_large().with_message(format!(
            "{size_bytes} bytes exceeds the {MAX_UPLOAD_BYTES} byte limit"
        )));
    }

    Ok(media_type)
}

/// Derives a collision-resistant staged file name.
fn opaque_name(media_type: MediaType) -> String {
    format!(
        "{}-{}.{}",
        media_type.storage_prefix(),
        Uuid::now_v7().simple(),
        media_type.extension()
    )
}

/// An upload held on local disk until it is durably stored or rejected.
///
/// The backing file is removed exactly once: explicitly through
/// [`discard`], or as a last resort when the handle is dropped.
///
/// [`discard`]: StagedFile::discard
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    media_type: MediaType,
    size_bytes: u64,
    original_name: String,
    removed: bool,
}

impl StagedFile {
    /// Returns the path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the validated media type.
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Returns the staged size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Returns the name the file was uploaded under.
    ///
    /// Caller-supplied and display-only; storage addressing never uses it.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Opens the staged file for reading.
    pub async fn open(&self) -> Result<tokio::fs::File> {
        Ok(tokio::fs::File::open(&self.path).await?)
    }

    /// Removes the staged file from disk.
    pub async fn discard(mut self) -> Result<()> {
        self.removed = true;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            // Already gone counts as removed.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(
            target: TRACING_TARGET,
            path = %self.path.display(),
            "Staged file discarded"
        );

        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }

        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    target: TRACING_TARGET,
                    path = %self.path.display(),
                    error = %err,
                    "Failed to remove staged file on drop"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;

    fn staging() -> (TempDir, StagingArea) {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path());
        (dir, area)
    }

    fn entries(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_and_discard() {
        let (dir, area) = staging();

        let staged = area
            .stage("policy.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(staged.media_type(), MediaType::Pdf);
        assert_eq!(staged.size_bytes(), 8);
        assert_eq!(staged.original_name(), "policy.pdf");
        assert!(staged.path().exists());
        assert_eq!(entries(&dir), 1);

        staged.discard().await.unwrap();
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_opaque_names_never_reuse_input() {
        let (_dir, area) = staging();

        let staged = area
            .stage("../../../etc/passwd", "image/png", b"png")
            .await
            .unwrap();

        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("scan-"));
        assert!(name.ends_with(".png"));
        assert!(!name.contains("passwd"));

        staged.discard().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_media_type_writes_nothing() {
        let (dir, area) = staging();

        let err = area
            .stage("notes.txt", "text/plain", b"hello")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedMediaType);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_oversize_writes_nothing() {
        let (dir, area) = staging();

        let content = vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize];
        let err = area
            .stage("big.jpg", "image/jpeg", &content)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FileTooLarge);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let (dir, area) = staging();

        let staged = area
            .stage("scan.jpg", "image/jpeg", b"jpeg")
            .await
            .unwrap();
        assert_eq!(entries(&dir), 1);

        drop(staged);
        assert_eq!(entries(&dir), 0);
    }

    #[tokio::test]
    async fn test_adopt_validates_and_cleans_up() {
        let (dir, area) = staging();
        area.init().await.unwrap();

        let path = dir.path().join("incoming");
        tokio::fs::write(&path, b"bytes").await.unwrap();

        let err = area
            .adopt(&path, "notes.txt", "text/plain")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMediaType);
        assert!(!path.exists());

        let path = dir.path().join("incoming-scan");
        tokio::fs::write(&path, b"png").await.unwrap();

        let staged = area.adopt(&path, "scan.png", "image/png").await.unwrap();
        assert_eq!(staged.size_bytes(), 3);
        staged.discard().await.unwrap();
        assert!(!dir.path().join("incoming-scan").exists());
    }

    #[tokio::test]
    async fn test_discard_tolerates_missing_file() {
        let (_dir, area) = staging();

        let staged = area
            .stage("scan.png", "image/png", b"png")
            .await
            .unwrap();

        tokio::fs::remove_file(staged.path()).await.unwrap();
        staged.discard().await.unwrap();
    }
}
