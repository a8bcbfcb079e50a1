//! Workspace umbrella crate.
//!
//! Exposes the `desktop-shims` feature that pulls in the service façade with
//! the desktop bridge defaults. Host applications can depend on
//! `steplay-workspace` instead of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_library as library;
#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;
#[cfg(feature = "desktop-shims")]
pub use core_service as service;
