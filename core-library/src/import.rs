//! # Clip Import
//!
//! Copies a user-picked media file into durable app storage and records it
//! as the next step. The returned step's uri survives app restarts; nothing
//! is appended unless the copy is confirmed on disk.

use crate::error::{LibraryError, Result};
use crate::models::StepRecord;
use crate::repositories::StepRepository;
use bridge_traits::error::BridgeError;
use bridge_traits::storage::FileSystemAccess;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Extension used when the picked file has none.
const FALLBACK_EXTENSION: &str = "mp4";

pub struct ClipImporter {
    file_system: Arc<dyn FileSystemAccess>,
    repository: Arc<dyn StepRepository>,
    clips_dir_name: String,
}

impl ClipImporter {
    pub fn new(
        file_system: Arc<dyn FileSystemAccess>,
        repository: Arc<dyn StepRepository>,
        clips_dir_name: impl Into<String>,
    ) -> Self {
        Self {
            file_system,
            repository,
            clips_dir_name: clips_dir_name.into(),
        }
    }

    /// Directory imported clips are copied into.
    pub async fn clips_directory(&self) -> Result<PathBuf> {
        let data_dir = self.file_system.get_data_directory().await?;
        Ok(data_dir.join(&self.clips_dir_name))
    }

    /// Import `source` as the next step.
    ///
    /// # Errors
    /// - `NotFound` if `source` does not exist
    /// - `Bridge` if the copy fails or cannot be confirmed
    /// - Any repository error from appending; the copy is removed again
    #[instrument(skip(self), fields(source = %source.display()))]
    pub async fn import(&self, source: &Path) -> Result<StepRecord> {
        if !self.file_system.exists(source).await? {
            return Err(LibraryError::NotFound {
                entity_type: "clip".to_string(),
                id: source.display().to_string(),
            });
        }

        let clips_dir = self.clips_directory().await?;
        self.file_system.create_dir_all(&clips_dir).await?;

        let target = clips_dir.join(format!("{}.{}", Uuid::new_v4(), extension_of(source)));
        let bytes = self.file_system.copy_file(source, &target).await?;

        if !self.file_system.exists(&target).await? {
            return Err(LibraryError::Bridge(BridgeError::OperationFailed(format!(
                "copied clip missing at {}",
                target.display()
            ))));
        }

        let filename = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.display().to_string());
        let uri = target.to_string_lossy().into_owned();

        match self.repository.append_step(&uri, &filename).await {
            Ok(step) => {
                info!(step_id = %step.id, step_number = step.step_number, bytes, "Clip imported");
                Ok(step)
            }
            Err(err) => {
                if let Err(cleanup) = self.file_system.delete_file(&target).await {
                    warn!(target = %target.display(), error = %cleanup, "Failed to remove orphaned clip");
                }
                Err(err)
            }
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(FALLBACK_EXTENSION)
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::storage::FileMetadata;
    use mockall::mock;

    mock! {
        Fs {}

        #[async_trait]
        impl FileSystemAccess for Fs {
            async fn get_data_directory(&self) -> BridgeResult<PathBuf>;
            async fn exists(&self, path: &Path) -> BridgeResult<bool>;
            async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata>;
            async fn create_dir_all(&self, path: &Path) -> BridgeResult<()>;
            async fn copy_file(&self, from: &Path, to: &Path) -> BridgeResult<u64>;
            async fn delete_file(&self, path: &Path) -> BridgeResult<()>;
        }
    }

    mock! {
        Steps {}

        #[async_trait]
        impl StepRepository for Steps {
            async fn get_ordered_steps(&self) -> Result<Vec<StepRecord>>;
            async fn set_ordered_steps(&self, steps: &[StepRecord]) -> Result<()>;
            async fn append_step(&self, uri: &str, filename: &str) -> Result<StepRecord>;
            async fn reset(&self) -> Result<usize>;
        }
    }

    #[test]
    fn test_extension_is_normalized() {
        assert_eq!(extension_of(Path::new("/p/Clip.MOV")), "mov");
        assert_eq!(extension_of(Path::new("/p/clip")), "mp4");
    }

    #[core_async::test]
    async fn test_missing_source_is_not_found() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(false));
        fs.expect_copy_file().never();
        let mut steps = MockSteps::new();
        steps.expect_append_step().never();

        let importer = ClipImporter::new(Arc::new(fs), Arc::new(steps), "clips");
        let result = importer.import(Path::new("/picked/gone.mp4")).await;

        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
    }

    #[core_async::test]
    async fn test_copy_failure_leaves_list_unchanged() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_get_data_directory()
            .returning(|| Ok(PathBuf::from("/data")));
        fs.expect_create_dir_all()
            .withf(|path| path == Path::new("/data/clips"))
            .returning(|_| Ok(()));
        fs.expect_copy_file()
            .returning(|_, _| Err(BridgeError::OperationFailed("disk full".to_string())));
        let mut steps = MockSteps::new();
        steps.expect_append_step().never();

        let importer = ClipImporter::new(Arc::new(fs), Arc::new(steps), "clips");
        let result = importer.import(Path::new("/picked/a.mp4")).await;

        assert!(matches!(result, Err(LibraryError::Bridge(_))));
    }

    #[core_async::test]
    async fn test_import_appends_durable_copy() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_get_data_directory()
            .returning(|| Ok(PathBuf::from("/data")));
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_copy_file()
            .withf(|from, to| {
                from == Path::new("/picked/Jump.MOV")
                    && to.starts_with("/data/clips")
                    && to.extension().and_then(|e| e.to_str()) == Some("mov")
            })
            .returning(|_, _| Ok(2048));
        let mut steps = MockSteps::new();
        steps
            .expect_append_step()
            .withf(|uri, filename| uri.starts_with("/data/clips/") && filename == "Jump.MOV")
            .returning(|uri, filename| Ok(StepRecord::new(1, uri, filename)));

        let importer = ClipImporter::new(Arc::new(fs), Arc::new(steps), "clips");
        let step = importer.import(Path::new("/picked/Jump.MOV")).await.unwrap();

        assert_eq!(step.step_number, 1);
        assert_eq!(step.filename, "Jump.MOV");
        assert!(step.uri.ends_with(".mov"));
    }

    #[core_async::test]
    async fn test_append_failure_removes_copy() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_get_data_directory()
            .returning(|| Ok(PathBuf::from("/data")));
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_copy_file().returning(|_, _| Ok(10));
        fs.expect_delete_file()
            .withf(|path| path.starts_with("/data/clips"))
            .times(1)
            .returning(|_| Ok(()));
        let mut steps = MockSteps::new();
        steps.expect_append_step().returning(|_, _| {
            Err(LibraryError::Corrupt("unreadable".to_string()))
        });

        let importer = ClipImporter::new(Arc::new(fs), Arc::new(steps), "clips");
        let result = importer.import(Path::new("/picked/a.mp4")).await;

        assert!(matches!(result, Err(LibraryError::Corrupt(_))));
    }
}
