//! # Clip Surface
//!
//! Session-side record and command sequencing for one host [`MediaSurface`].
//!
//! ## Lifecycle
//!
//! ```text
//!            load            load ok          play ok
//!   Empty ─────────> Loading ───────> Ready ─────────> Playing
//!     ^                 │ load err      ^  │              │
//!     └─────────────────┘               │  │ load         │ stop
//!     ^                                 │  v              v
//!     │ unload                          └─ Loading    Stopping ──> Ready
//!     └───────────────── any settled phase                (stop ok)
//! ```
//!
//! Commands to one surface are strictly sequenced by an async op lock. After
//! [`ClipSurface::close`] every command fails with
//! [`PlaybackError::SessionClosed`] without reaching the host, and results of
//! commands already in flight are discarded.

use crate::error::{PlaybackError, Result};
use crate::playlist::ClipRef;
use bridge_traits::surface::{MediaSurface, PlayOptions};
use core_async::sync::Mutex as OpLock;
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// One of the two surfaces of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceId {
    Zero,
    One,
}

impl SurfaceId {
    /// The other surface.
    pub fn other(self) -> Self {
        match self {
            SurfaceId::Zero => SurfaceId::One,
            SurfaceId::One => SurfaceId::Zero,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SurfaceId::Zero => 0,
            SurfaceId::One => 1,
        }
    }

    pub fn as_u8(self) -> u8 {
        self.index() as u8
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.index())
    }
}

/// Lifecycle phase of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfacePhase {
    /// No clip, no decoder resources.
    Empty,
    /// Load in flight.
    Loading,
    /// First frame decoded, paused.
    Ready,
    /// Looping playback.
    Playing,
    /// Stop requested, not yet confirmed.
    Stopping,
}

impl fmt::Display for SurfacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfacePhase::Empty => "empty",
            SurfacePhase::Loading => "loading",
            SurfacePhase::Ready => "ready",
            SurfacePhase::Playing => "playing",
            SurfacePhase::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Observable record of a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceState {
    pub loaded_clip: Option<ClipRef>,
    pub phase: SurfacePhase,
}

impl SurfaceState {
    fn empty() -> Self {
        Self {
            loaded_clip: None,
            phase: SurfacePhase::Empty,
        }
    }

    /// Whether `clip` is loaded and paused on its first frame.
    pub fn holds_ready(&self, clip: &ClipRef) -> bool {
        self.phase == SurfacePhase::Ready
            && self.loaded_clip.as_ref().map(|c| c.id.as_str()) == Some(clip.id.as_str())
    }

    fn clip_id(&self) -> String {
        self.loaded_clip
            .as_ref()
            .map(|c| c.id.clone())
            .unwrap_or_default()
    }
}

/// A host media surface plus the session's view of it.
pub struct ClipSurface {
    id: SurfaceId,
    media: Arc<dyn MediaSurface>,
    state: Mutex<SurfaceState>,
    op_lock: OpLock<()>,
    epoch: AtomicU64,
    closed: AtomicBool,
}

impl ClipSurface {
    pub fn new(id: SurfaceId, media: Arc<dyn MediaSurface>) -> Self {
        Self {
            id,
            media,
            state: Mutex::new(SurfaceState::empty()),
            op_lock: OpLock::new(()),
            epoch: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn state(&self) -> SurfaceState {
        self.state.lock().clone()
    }

    pub fn phase(&self) -> SurfacePhase {
        self.state.lock().phase
    }

    pub fn holds_ready(&self, clip: &ClipRef) -> bool {
        self.state.lock().holds_ready(clip)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Opens `clip` paused on its first frame.
    ///
    /// Allowed from `Empty`, `Ready` and `Stopping`. On failure, or if the
    /// returned future is dropped before the host answers, the surface is
    /// left `Empty`.
    pub async fn load(&self, clip: &ClipRef) -> Result<()> {
        let _op = self.op_lock.lock().await;
        let epoch = self.begin("load", |phase| {
            matches!(
                phase,
                SurfacePhase::Empty | SurfacePhase::Ready | SurfacePhase::Stopping
            )
        })?;

        {
            let mut state = self.state.lock();
            state.phase = SurfacePhase::Loading;
            state.loaded_clip = Some(clip.clone());
        }
        let mut pending = PendingLoad {
            surface: self,
            epoch,
            settled: false,
        };

        debug!(
            surface = %self.id,
            clip_id = %clip.id,
            file = %strip_path(&clip.locator),
            "Loading clip"
        );
        let result = self.media.load(&clip.load_request()).await;
        pending.settled = true;

        match result {
            Ok(()) => {
                self.commit(epoch, |state| state.phase = SurfacePhase::Ready)?;
                debug!(surface = %self.id, clip_id = %clip.id, "Clip ready");
                Ok(())
            }
            Err(source) => {
                self.commit(epoch, |state| *state = SurfaceState::empty())?;
                Err(PlaybackError::Load {
                    clip_id: clip.id.clone(),
                    source,
                })
            }
        }
    }

    /// Starts playback of the ready clip. On failure the surface stays `Ready`.
    pub async fn play(&self, options: PlayOptions) -> Result<()> {
        let _op = self.op_lock.lock().await;
        let epoch = self.begin("play", |phase| phase == SurfacePhase::Ready)?;
        let clip_id = self.state.lock().clip_id();

        let result = self.media.play(options).await;

        match result {
            Ok(()) => {
                self.commit(epoch, |state| state.phase = SurfacePhase::Playing)?;
                debug!(surface = %self.id, clip_id = %clip_id, "Playing");
                Ok(())
            }
            Err(source) => {
                self.commit(epoch, |_| {})?;
                Err(PlaybackError::Play { clip_id, source })
            }
        }
    }

    /// Halts playback and rewinds, keeping the clip loaded.
    ///
    /// If the host rejects the stop the surface stays `Stopping`.
    pub async fn stop(&self) -> Result<()> {
        let _op = self.op_lock.lock().await;
        let epoch = self.begin("stop", |phase| {
            matches!(phase, SurfacePhase::Playing | SurfacePhase::Stopping)
        })?;
        self.state.lock().phase = SurfacePhase::Stopping;

        let result = self.media.stop().await;

        self.commit(epoch, |state| {
            if result.is_ok() {
                state.phase = SurfacePhase::Ready;
            }
        })?;
        result.map_err(PlaybackError::from)
    }

    /// Releases the loaded clip. A no-op on an empty surface.
    pub async fn unload(&self) -> Result<()> {
        let _op = self.op_lock.lock().await;
        let epoch = self.begin("unload", |phase| phase != SurfacePhase::Loading)?;
        if self.phase() == SurfacePhase::Empty {
            return Ok(());
        }

        let result = self.media.unload().await;

        self.commit(epoch, |state| {
            if result.is_ok() {
                *state = SurfaceState::empty();
            }
        })?;
        result.map_err(PlaybackError::from)
    }

    /// Detaches the surface from its session.
    ///
    /// In-flight results are discarded and later commands fail with
    /// `SessionClosed`. Host resources stay allocated until [`release`].
    ///
    /// [`release`]: ClipSurface::release
    pub fn close(&self) {
        let _state = self.state.lock();
        self.closed.store(true, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Waits for any in-flight command, then unloads host resources.
    pub async fn release(&self) -> Result<()> {
        let _op = self.op_lock.lock().await;
        let needs_unload = self.state.lock().phase != SurfacePhase::Empty;
        if !needs_unload {
            return Ok(());
        }

        // An unconfirmed stop can leave the host surface running.
        let result = self.media.unload().await;
        *self.state.lock() = SurfaceState::empty();
        if let Err(err) = &result {
            warn!(surface = %self.id, error = %err, "Failed to release surface");
        }
        result.map_err(PlaybackError::from)
    }

    /// Checks the surface is open and in an allowed phase, returning the
    /// epoch the command runs under.
    fn begin(&self, operation: &'static str, allowed: impl Fn(SurfacePhase) -> bool) -> Result<u64> {
        let state = self.state.lock();
        if self.is_closed() {
            return Err(PlaybackError::SessionClosed);
        }
        if !allowed(state.phase) {
            return Err(PlaybackError::InvalidState {
                operation,
                phase: format!("{} is {}", self.id, state.phase),
            });
        }
        Ok(self.epoch.load(Ordering::SeqCst))
    }

    /// Applies a command's outcome unless the surface was closed meanwhile.
    fn commit(&self, epoch: u64, apply: impl FnOnce(&mut SurfaceState)) -> Result<()> {
        let mut state = self.state.lock();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(surface = %self.id, "Discarding late surface result");
            return Err(PlaybackError::SessionClosed);
        }
        apply(&mut state);
        Ok(())
    }
}

/// Resets a surface whose load future was dropped before the host answered.
struct PendingLoad<'a> {
    surface: &'a ClipSurface,
    epoch: u64,
    settled: bool,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.surface.state.lock();
        if self.surface.epoch.load(Ordering::SeqCst) == self.epoch
            && state.phase == SurfacePhase::Loading
        {
            *state = SurfaceState::empty();
            debug!(surface = %self.surface.id, "Abandoned load; surface reset");
        }
    }
}

impl fmt::Debug for ClipSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipSurface")
            .field("id", &self.id)
            .field("state", &*self.state.lock())
            .field("closed", &self.is_closed())
            .finish()
    }
}
