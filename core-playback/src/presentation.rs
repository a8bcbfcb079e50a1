//! # Presentation Layer
//!
//! Projects session snapshots into what the host draws: both surfaces
//! stacked with only the active one opaque, a full-bounds invisible tap
//! region, and a progress indicator until the session is ready. Taps are
//! forwarded to the coordinator; no playback decision is made here.

use crate::coordinator::{AdvanceOutcome, CoordinatorPhase, PlaybackCoordinator, SessionSnapshot};
use crate::error::{PlaybackError, Result};
use crate::surface::SurfaceId;
use core_async::sync::watch;
use std::sync::Arc;

/// Draw parameters of one surface layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFrame {
    pub surface: SurfaceId,
    /// 1.0 for the active surface, 0.0 for the standby
    pub opacity: f32,
    /// Higher draws in front
    pub z_index: u8,
}

impl LayerFrame {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Invisible region covering the whole view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapRegion {
    /// Whether taps are dispatched to the coordinator
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressIndicator {
    pub visible: bool,
    pub percent: u8,
}

/// Everything the host needs to render one frame of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationFrame {
    /// Back to front
    pub layers: [LayerFrame; 2],
    pub tap_region: TapRegion,
    pub progress: ProgressIndicator,
}

impl PresentationFrame {
    /// Projects a snapshot. Pure; the same snapshot always yields the same frame.
    pub fn project(snapshot: &SessionSnapshot) -> Self {
        let active = snapshot.active_surface;
        let standby = active.other();

        let tap_enabled = snapshot.ready
            && matches!(
                snapshot.phase,
                CoordinatorPhase::Ready | CoordinatorPhase::Advancing
            );

        Self {
            layers: [
                LayerFrame {
                    surface: standby,
                    opacity: 0.0,
                    z_index: 0,
                },
                LayerFrame {
                    surface: active,
                    opacity: 1.0,
                    z_index: 1,
                },
            ],
            tap_region: TapRegion {
                enabled: tap_enabled,
            },
            progress: ProgressIndicator {
                visible: !snapshot.ready && snapshot.phase == CoordinatorPhase::Initializing,
                percent: snapshot.progress,
            },
        }
    }

    /// The opaque, front-most layer.
    pub fn active_layer(&self) -> &LayerFrame {
        &self.layers[1]
    }
}

/// Host-facing view of a session.
pub struct PresentationLayer {
    coordinator: Arc<PlaybackCoordinator>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl PresentationLayer {
    pub fn new(coordinator: Arc<PlaybackCoordinator>) -> Self {
        let snapshots = coordinator.subscribe();
        Self {
            coordinator,
            snapshots,
        }
    }

    pub fn coordinator(&self) -> &Arc<PlaybackCoordinator> {
        &self.coordinator
    }

    /// Frame for the latest published snapshot.
    pub fn frame(&self) -> PresentationFrame {
        PresentationFrame::project(&self.snapshots.borrow())
    }

    /// Waits for the next snapshot and returns its frame.
    ///
    /// Fails with `SessionClosed` once the coordinator is dropped.
    pub async fn changed(&mut self) -> Result<PresentationFrame> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| PlaybackError::SessionClosed)?;
        Ok(PresentationFrame::project(&self.snapshots.borrow_and_update()))
    }

    /// Handles a tap anywhere in the view.
    pub async fn tap(&self) -> Result<AdvanceOutcome> {
        if !self.frame().tap_region.enabled {
            return Ok(AdvanceOutcome::Ignored);
        }
        self.coordinator.advance().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(phase: CoordinatorPhase, active: SurfaceId, ready: bool, progress: u8) -> SessionSnapshot {
        SessionSnapshot {
            session_id: "session".to_string(),
            phase,
            cursor: 0,
            clip_count: 3,
            active_surface: active,
            ready,
            progress,
        }
    }

    #[test]
    fn test_active_surface_is_opaque_and_in_front() {
        let frame = PresentationFrame::project(&snapshot(
            CoordinatorPhase::Ready,
            SurfaceId::One,
            true,
            100,
        ));

        assert_eq!(frame.active_layer().surface, SurfaceId::One);
        assert!(frame.active_layer().is_visible());
        assert_eq!(frame.layers[0].surface, SurfaceId::Zero);
        assert_eq!(frame.layers[0].opacity, 0.0);
        assert!(frame.layers[1].z_index > frame.layers[0].z_index);
        assert!(frame.tap_region.enabled);
        assert!(!frame.progress.visible);
    }

    #[test]
    fn test_progress_shown_until_ready() {
        let frame = PresentationFrame::project(&snapshot(
            CoordinatorPhase::Initializing,
            SurfaceId::Zero,
            false,
            50,
        ));

        assert!(frame.progress.visible);
        assert_eq!(frame.progress.percent, 50);
        assert!(!frame.tap_region.enabled);
    }

    #[test]
    fn test_taps_disabled_after_finish_or_close() {
        for phase in [CoordinatorPhase::Finished, CoordinatorPhase::Closed] {
            let frame = PresentationFrame::project(&snapshot(phase, SurfaceId::Zero, true, 100));
            assert!(!frame.tap_region.enabled);
            assert!(!frame.progress.visible);
        }
    }

    #[test]
    fn test_advancing_keeps_taps_enabled() {
        let frame = PresentationFrame::project(&snapshot(
            CoordinatorPhase::Advancing,
            SurfaceId::Zero,
            true,
            100,
        ));
        assert!(frame.tap_region.enabled);
    }
}
