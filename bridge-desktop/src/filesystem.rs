//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const APP_DIR_NAME: &str = "steplay";

/// Tokio-based file system implementation
///
/// Imported clips live under the platform data directory
/// (`~/.local/share/steplay` on Linux) so they survive restarts.
pub struct TokioFileSystem {
    data_dir: PathBuf,
}

impl TokioFileSystem {
    /// Create a file system accessor rooted at the platform data directory
    pub fn new() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join(APP_DIR_NAME);

        Self { data_dir }
    }

    /// Create a file system accessor rooted at a custom directory
    pub fn with_data_directory(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn get_data_directory(&self) -> Result<PathBuf> {
        if !fs::try_exists(&self.data_dir).await.map_err(BridgeError::Io)? {
            fs::create_dir_all(&self.data_dir)
                .await
                .map_err(BridgeError::Io)?;
            debug!(path = ?self.data_dir, "Created data directory");
        }
        Ok(self.data_dir.clone())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(BridgeError::Io)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(BridgeError::Io)?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await.map_err(BridgeError::Io)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        if let Some(parent) = to.parent() {
            self.create_dir_all(parent).await?;
        }

        let bytes = fs::copy(from, to).await.map_err(BridgeError::Io)?;
        debug!(from = ?from, to = ?to, bytes, "Copied file");
        Ok(bytes)
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(BridgeError::Io)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[core_async::test]
    async fn test_data_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        let fs = TokioFileSystem::with_data_directory(root.clone());

        assert_eq!(fs.get_data_directory().await.unwrap(), root);
        assert!(fs.exists(&root).await.unwrap());
        assert!(fs.metadata(&root).await.unwrap().is_directory);
    }

    #[core_async::test]
    async fn test_copy_creates_parents_and_preserves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("picked.mp4");
        tokio::fs::write(&source, b"clip-bytes").await.unwrap();

        let fs = TokioFileSystem::with_data_directory(dir.path().join("data"));
        let target = dir.path().join("data").join("clips").join("copy.mp4");

        let copied = fs.copy_file(&source, &target).await.unwrap();
        assert_eq!(copied, 10);
        assert_eq!(fs.metadata(&target).await.unwrap().size, 10);

        fs.delete_file(&target).await.unwrap();
        assert!(!fs.exists(&target).await.unwrap());
    }

    #[core_async::test]
    async fn test_copy_missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::with_data_directory(dir.path().to_path_buf());

        let result = fs
            .copy_file(&dir.path().join("missing.mp4"), &dir.path().join("out.mp4"))
            .await;
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }
}
