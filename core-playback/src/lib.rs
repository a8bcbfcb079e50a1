//! # Gapless Step Playback Module
//!
//! Plays an ordered list of short clips one tap at a time with no visible gap
//! between them.
//!
//! ## Overview
//!
//! This module handles:
//! - The immutable [`Playlist`] of imported clips
//! - [`ClipSurface`] lifecycles over two host media surfaces
//! - The double-buffered [`PlaybackCoordinator`] state machine
//! - The [`PresentationLayer`] projection the host renders and taps on
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackConfig, PlaybackCoordinator, Playlist, PresentationLayer};
//! use std::sync::Arc;
//!
//! let coordinator = Arc::new(
//!     PlaybackCoordinator::new(playlist, [surface_a, surface_b], PlaybackConfig::default())?
//!         .with_exit_callback(|| navigate_back()),
//! );
//! coordinator.initialize().await?;
//!
//! let presentation = PresentationLayer::new(coordinator.clone());
//! presentation.tap().await?;
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod playlist;
pub mod presentation;
pub mod surface;

pub use config::PlaybackConfig;
pub use coordinator::{
    AdvanceOutcome, CoordinatorPhase, ExitCallback, PlaybackCoordinator, SessionSnapshot,
};
pub use error::{PlaybackError, Result};
pub use playlist::{ClipRef, Playlist};
pub use presentation::{LayerFrame, PresentationFrame, PresentationLayer, ProgressIndicator, TapRegion};
pub use surface::{ClipSurface, SurfaceId, SurfacePhase, SurfaceState};
