//! # Desktop Bridge Implementations
//!
//! Default implementations of the storage bridge traits for desktop
//! platforms (macOS, Windows, Linux):
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `FileSystemAccess` using `tokio::fs` under the platform data directory
//!
//! Media surfaces are not provided here; they belong to the host UI toolkit.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{SqliteSettingsStore, TokioFileSystem};
//!
//! #[core_async::main]
//! async fn main() {
//!     let settings = SqliteSettingsStore::new("steplay/settings.db".into()).await.unwrap();
//!     let fs = TokioFileSystem::new();
//!     // Hand both to `CoreConfig::builder()`
//! }
//! ```

mod filesystem;
mod settings;

pub use filesystem::TokioFileSystem;
pub use settings::SqliteSettingsStore;
