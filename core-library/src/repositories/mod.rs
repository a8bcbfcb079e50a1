//! # Repository Pattern Implementation
//!
//! Repository traits and implementations for the stored step list.
//!
//! ## Architecture
//!
//! - Traits define the interface each store exposes to the service
//! - The settings-backed implementation keeps the whole list as one JSON
//!   document under a namespaced key
//! - All operations return `Result<T>` for error handling

pub mod step;

pub use step::{SettingsStepRepository, StepRepository};
