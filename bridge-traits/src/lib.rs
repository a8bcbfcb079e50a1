//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host platform implements.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the host.
//! Each trait is a capability the core needs but that is implemented
//! differently per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaSurface`](surface::MediaSurface) - One decode/render unit; the core drives two
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value storage (holds the step list)
//! - [`FileSystemAccess`](storage::FileSystemAccess) - App-storage file operations for clip import
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Storage + filesystem |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! Media surfaces are always supplied by the host UI layer.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and include context such as file
//! paths or clip identifiers.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod logging;
pub mod storage;
pub mod surface;

pub use error::{BridgeError, Result};

pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::{FileMetadata, FileSystemAccess, SettingsStore};
pub use surface::{LoadRequest, MediaSource, MediaSurface, PlayOptions};
