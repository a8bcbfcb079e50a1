//! # Core Configuration Module
//!
//! Provides configuration management for the step playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and settings the core needs. It enforces
//! fail-fast validation so missing bridges are reported before anything starts.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Required for the persisted step list
//! - `FileSystemAccess` - Required for importing clips into app storage
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! both are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/steplay.db")
//!     .data_dir("/path/to/data")
//!     .settings_store(Arc::new(MySettingsStore))
//!     .file_system(Arc::new(MyFileSystem))
//!     .steps_key("myapp.steps")
//!     .build()?;
//! ```
//!
//! The database path is only needed when the default SQLite settings store
//! has to be built; hosts injecting their own store can leave it unset.
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing paths produce an actionable error
//! let config = CoreConfig::builder()
//!     .data_dir("/path/to/data")
//!     .build()
//!     .expect("Should fail - missing database path");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{FileSystemAccess, SettingsStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings key the ordered step list is stored under by default.
pub const DEFAULT_STEPS_KEY: &str = "steplay.steps";

/// Directory (inside the data directory) imported clips are copied into.
pub const DEFAULT_CLIPS_DIR: &str = "clips";

/// Core configuration for the step playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file backing the default settings store
    pub database_path: Option<PathBuf>,

    /// Durable application data directory
    pub data_dir: PathBuf,

    /// Key-value storage for the step list (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// File system access used by clip import (required)
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Settings key holding the JSON step list
    pub steps_key: String,

    /// Name of the clip directory under the data directory
    pub clips_dir_name: String,

    /// Per-subscriber event buffer
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("data_dir", &self.data_dir)
            .field("settings_store", &"SettingsStore { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("steps_key", &self.steps_key)
            .field("clips_dir_name", &self.clips_dir_name)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path (when set) and data directory are not empty
    /// - The steps key is not blank
    /// - The clips directory is a single relative path component
    /// - The event buffer holds at least one event
    pub fn validate(&self) -> Result<()> {
        if self
            .database_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("Data directory cannot be empty".to_string()));
        }

        if self.steps_key.trim().is_empty() {
            return Err(Error::Config("Steps key cannot be empty".to_string()));
        }

        let clips = Path::new(&self.clips_dir_name);
        if self.clips_dir_name.is_empty()
            || clips.is_absolute()
            || clips.components().count() != 1
            || self.clips_dir_name == ".."
        {
            return Err(Error::Config(format!(
                "Clips directory must be a single relative name, got '{}'",
                self.clips_dir_name
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute clip directory under the configured data directory.
    pub fn clips_dir(&self) -> PathBuf {
        self.data_dir.join(&self.clips_dir_name)
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for the step list. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required to import clips. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TokioFileSystem. \
                 Mobile: inject the sandboxed document directory accessor."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use core_async::runtime::{Handle, Runtime};

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on panics inside a runtime, so initialize on a scratch thread there.
    let store = match Handle::try_current() {
        Ok(_) => {
            let path = database_path.to_path_buf();
            thread::spawn(move || init_store(path))
                .join()
                .map_err(|_| {
                    Error::Internal(
                        "Worker thread panicked while creating default SettingsStore".to_string(),
                    )
                })??
        }
        Err(_) => init_store(database_path.to_path_buf())?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system(data_dir: &Path) -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> =
        Arc::new(TokioFileSystem::with_data_directory(data_dir.to_path_buf()));
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system(_data_dir: &Path) -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    steps_key: Option<String>,
    clips_dir_name: Option<String>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the database path of the default settings store.
    ///
    /// Required unless a settings store is injected.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().database_path("/path/to/steplay.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the durable data directory imported clips are copied under.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the file system access implementation (required).
    ///
    /// If not provided, the desktop default (tokio fs-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Overrides the settings key of the step list.
    ///
    /// Default: `steplay.steps`
    pub fn steps_key(mut self, key: impl Into<String>) -> Self {
        self.steps_key = Some(key.into());
        self
    }

    /// Overrides the clip directory name.
    ///
    /// Default: `clips`
    pub fn clips_dir_name(mut self, name: impl Into<String>) -> Self {
        self.clips_dir_name = Some(name.into());
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The data directory is missing, or the database path is missing while
    ///   no settings store was injected
    /// - Required bridges are missing (SettingsStore, FileSystemAccess)
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let data_dir = self.data_dir.ok_or_else(|| {
            Error::Config("Data directory is required. Use .data_dir() to set it.".to_string())
        })?;

        let database_path = self.database_path;
        let settings_store = match self.settings_store {
            Some(store) => store,
            None => {
                let path = database_path.as_deref().ok_or_else(|| {
                    Error::Config(
                        "Database path is required for the default settings store. \
                         Use .database_path() or inject .settings_store()."
                            .to_string(),
                    )
                })?;
                provide_default_settings_store(path)?
            }
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system(&data_dir)?,
        };

        let config = CoreConfig {
            database_path,
            data_dir,
            settings_store,
            file_system,
            steps_key: self
                .steps_key
                .unwrap_or_else(|| DEFAULT_STEPS_KEY.to_string()),
            clips_dir_name: self
                .clips_dir_name
                .unwrap_or_else(|| DEFAULT_CLIPS_DIR.to_string()),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
