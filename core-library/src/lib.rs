//! # Step Library
//!
//! Owns the persisted, ordered list of step clips and the import path that
//! brings new clips into durable app storage.
//!
//! ## Overview
//!
//! This module manages:
//! - The `StepRecord` model stored as a JSON array under one settings key
//! - Repository access to the list (read ordered, replace, append, reset)
//! - Copying picked media into `<data dir>/clips/` before it becomes a step
//!
//! Playback never writes through this crate; it consumes
//! [`StepRecord::to_clip_ref`] output as its playlist.

pub mod error;
pub mod import;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use import::ClipImporter;
pub use models::StepRecord;
pub use repositories::{SettingsStepRepository, StepRepository};
