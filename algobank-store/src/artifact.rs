//! Artifact store abstraction and the filesystem implementation.
//!
//! An artifact is one opaque source text, written once and never rewritten.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use algobank_core::ArtifactKey;

use crate::StoreError;

/// Blob storage for persisted source texts.
///
/// # Cancel Safety
/// `read` and `delete` are cancel safe. Dropping a `create` future may leave
/// a partially written artifact that no record references.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persists `text` under `key`. Never overwrites an existing artifact.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the artifact cannot be written, including
    /// when `key` is already taken.
    async fn create(&self, key: &ArtifactKey, text: &str) -> Result<(), StoreError>;

    /// Reads the text stored under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError::ArtifactNotFound`] if nothing is stored under `key`.
    async fn read(&self, key: &ArtifactKey) -> Result<String, StoreError>;

    /// Removes the artifact stored under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError::ArtifactNotFound`] if nothing is stored under `key`.
    async fn delete(&self, key: &ArtifactKey) -> Result<(), StoreError>;
}

/// Stores each artifact as a UTF-8 file below a root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a key to a file path, refusing anything but plain relative segments.
    fn resolve(&self, key: &ArtifactKey) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key.as_str());
        let plain = relative.components().next().is_some()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StoreError::ArtifactEscapesRoot { key: key.clone() });
        }
        Ok(self.root.join(relative))
    }
}

fn not_found_as(key: &ArtifactKey, err: std::io::Error) -> StoreError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StoreError::ArtifactNotFound { key: key.clone() }
    } else {
        StoreError::Io(err)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn create(&self, key: &ArtifactKey, text: &str) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        tracing::debug!(artifact = %key, bytes = text.len(), "artifact written");
        Ok(())
    }

    async fn read(&self, key: &ArtifactKey) -> Result<String, StoreError> {
        let path = self.resolve(key)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| not_found_as(key, e))
    }

    async fn delete(&self, key: &ArtifactKey) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_as(key, e))
    }
}
