//! Storage and File System Abstractions
//!
//! Provides platform-agnostic traits for durable key-value storage and for
//! the file operations clip import needs.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts the app-storage operations used when importing clips:
/// - Desktop: direct filesystem access under the platform data directory
/// - iOS/Android: sandboxed document directory
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn persist(fs: &dyn FileSystemAccess, picked: &Path) -> Result<PathBuf> {
///     let target = fs.get_data_directory().await?.join("clips").join("a.mp4");
///     fs.copy_file(picked, &target).await?;
///     Ok(target)
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get the application's durable data directory
    ///
    /// Files stored here survive app restarts.
    async fn get_data_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy `from` to `to`, creating parent directories as needed
    ///
    /// Returns the number of bytes copied.
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;
}

/// Key-value settings storage trait
///
/// Abstracts platform-specific persistent key-value storage:
/// - iOS: UserDefaults
/// - Android: SharedPreferences / DataStore
/// - Desktop: SQLite table
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember(store: &dyn SettingsStore, json: &str) -> Result<()> {
///     store.set_string("steplay.steps", json).await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
