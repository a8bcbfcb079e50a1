//! # Playback Coordinator
//!
//! Double-buffered playback over two [`ClipSurface`]s.
//!
//! ## Overview
//!
//! One surface is *active* (visible, audible, looping the current clip) while
//! the other is *standby* (hidden, holding the next clip paused on its first
//! frame). Each advance starts the standby, swaps the roles, stops the old
//! surface and preloads the following clip into it, so the visible cut never
//! waits on a decoder.
//!
//! ```text
//!                 initialize()
//!  Initializing ───────────────> Ready <──────────┐
//!       │ (start failed:             │ advance()   │ step 6
//!       │  stays, retryable)         v             │
//!       │                        Advancing ────────┘
//!       │                            │ cursor + 1 == N
//!       │                            v
//!       │                        Finished (exit callback fires once)
//!       │
//!       └──── exit() from any phase ───> Closed
//! ```
//!
//! ## Concurrency
//!
//! Session state lives behind a short-held mutex that is never held across an
//! `.await`. Only one advance runs at a time; taps arriving meanwhile return
//! [`AdvanceOutcome::Ignored`]. [`PlaybackCoordinator::exit`] cancels the
//! session token and closes both surfaces, so an advance suspended on the host
//! returns [`AdvanceOutcome::Cancelled`] and never issues another command.

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::playlist::{ClipRef, Playlist};
use crate::surface::{ClipSurface, SurfaceId, SurfacePhase, SurfaceState};
use bridge_traits::surface::{MediaSurface, PlayOptions};
use core_async::sync::{watch, CancellationToken};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Callback invoked when the last clip has been advanced past.
pub type ExitCallback = Box<dyn FnOnce() + Send + 'static>;

/// Coordinator state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinatorPhase {
    /// Initial dual preload pending or failed.
    Initializing,
    /// Active surface looping, taps accepted.
    Ready,
    /// Advance protocol in progress.
    Advancing,
    /// Playlist exhausted.
    Finished,
    /// Session exited before the end.
    Closed,
}

impl fmt::Display for CoordinatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinatorPhase::Initializing => "initializing",
            CoordinatorPhase::Ready => "ready",
            CoordinatorPhase::Advancing => "advancing",
            CoordinatorPhase::Finished => "finished",
            CoordinatorPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Published view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub phase: CoordinatorPhase,
    /// Zero-based playlist position on screen
    pub cursor: usize,
    pub clip_count: usize,
    pub active_surface: SurfaceId,
    /// Flips true once, after the initial preload and first play
    pub ready: bool,
    /// Initial preload progress, 0-100, never decreasing
    pub progress: u8,
}

/// Result of a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next clip is on screen.
    Advanced {
        cursor: usize,
        active_surface: SurfaceId,
    },
    /// The last clip was passed; the exit callback has fired.
    Finished,
    /// Another advance was in flight, or the session already finished.
    Ignored,
    /// The session was exited while this advance was suspended.
    Cancelled,
}

#[derive(Debug, Clone)]
struct SessionState {
    phase: CoordinatorPhase,
    cursor: usize,
    active: SurfaceId,
    ready: bool,
    progress: u8,
}

/// Clears the in-flight flag when the call ends or its future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Returns a session left `Advancing` to `Ready` on whatever clip is on
/// screen when an advance future is dropped.
struct AdvanceScope<'a>(&'a PlaybackCoordinator);

impl Drop for AdvanceScope<'_> {
    fn drop(&mut self) {
        let interrupted = {
            let mut state = self.0.state.lock();
            let interrupted = state.phase == CoordinatorPhase::Advancing;
            if interrupted {
                state.phase = CoordinatorPhase::Ready;
            }
            interrupted
        };
        if interrupted {
            warn!(session_id = %self.0.session_id, "Advance interrupted; back to ready");
            self.0.publish();
        }
    }
}

/// Owns both surfaces, the playlist and the cursor of one session.
///
/// Shared behind an `Arc` between the host (exit, shutdown) and the
/// [`PresentationLayer`](crate::presentation::PresentationLayer) (taps).
pub struct PlaybackCoordinator {
    session_id: String,
    playlist: Playlist,
    config: PlaybackConfig,
    surfaces: [ClipSurface; 2],
    state: Mutex<SessionState>,
    busy: AtomicBool,
    cancel: CancellationToken,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    events: Option<EventBus>,
    on_exit: Mutex<Option<ExitCallback>>,
}

impl PlaybackCoordinator {
    /// Creates a session over `playlist` driving the two host surfaces.
    pub fn new(
        playlist: Playlist,
        surfaces: [Arc<dyn MediaSurface>; 2],
        config: PlaybackConfig,
    ) -> Result<Self> {
        config.validate()?;

        let session_id = Uuid::new_v4().to_string();
        let [first, second] = surfaces;
        let state = SessionState {
            phase: CoordinatorPhase::Initializing,
            cursor: 0,
            active: SurfaceId::Zero,
            ready: false,
            progress: 0,
        };
        let (snapshot_tx, _) =
            watch::channel(Self::project(&session_id, playlist.len(), &state));

        Ok(Self {
            session_id,
            playlist,
            config,
            surfaces: [
                ClipSurface::new(SurfaceId::Zero, first),
                ClipSurface::new(SurfaceId::One, second),
            ],
            state: Mutex::new(state),
            busy: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            snapshot_tx,
            events: None,
            on_exit: Mutex::new(None),
        })
    }

    /// Publishes playback events on `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Registers the end-of-playlist callback.
    pub fn with_exit_callback<F>(self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        *self.on_exit.lock() = Some(Box::new(callback));
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// Current session view.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Records of both surfaces, indexed by [`SurfaceId::index`].
    pub fn surface_states(&self) -> [SurfaceState; 2] {
        [self.surfaces[0].state(), self.surfaces[1].state()]
    }

    /// Performs the initial dual preload and starts the first clip.
    ///
    /// Loads clip 0 into surface 0 and clip 1 (if any) into surface 1
    /// concurrently, then plays surface 0. On failure the session stays
    /// `Initializing` and the call may be repeated; surfaces that already
    /// hold their clip are not reloaded.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn initialize(&self) -> Result<()> {
        let _busy = BusyGuard::try_acquire(&self.busy).ok_or_else(|| {
            PlaybackError::InvalidState {
                operation: "initialize",
                phase: "initialization already running".to_string(),
            }
        })?;

        {
            let state = self.state.lock();
            match state.phase {
                CoordinatorPhase::Initializing => {}
                CoordinatorPhase::Closed => return Err(PlaybackError::SessionClosed),
                phase => {
                    return Err(PlaybackError::InvalidState {
                        operation: "initialize",
                        phase: phase.to_string(),
                    })
                }
            }
        }

        info!(clips = self.playlist.len(), "Initializing playback session");
        self.emit(PlaybackEvent::Initializing {
            session_id: self.session_id.clone(),
            clip_count: self.playlist.len(),
        });

        let first = &self.playlist[0];
        let second = self.playlist.get(1);
        let total_loads = if second.is_some() { 2 } else { 1 };
        let loaded = AtomicCount::default();

        let load_first = self.preload(SurfaceId::Zero, first, &loaded, total_loads);
        let load_second = async {
            match second {
                Some(clip) => self.preload(SurfaceId::One, clip, &loaded, total_loads).await,
                None => Ok(()),
            }
        };
        let (first_result, second_result) = futures::join!(load_first, load_second);

        if self.cancel.is_cancelled() {
            return Err(PlaybackError::SessionClosed);
        }
        if let Err(err) = first_result.and(second_result) {
            return Err(self.start_failed(err));
        }

        if let Err(err) = self.play_with_retry(SurfaceId::Zero).await {
            if self.cancel.is_cancelled() {
                return Err(PlaybackError::SessionClosed);
            }
            return Err(self.start_failed(err));
        }

        {
            let mut state = self.state.lock();
            if state.phase != CoordinatorPhase::Initializing {
                return Err(PlaybackError::SessionClosed);
            }
            state.phase = CoordinatorPhase::Ready;
            state.active = SurfaceId::Zero;
            state.cursor = 0;
            state.ready = true;
            state.progress = 100;
        }
        self.publish();

        info!(clip_id = %first.id, "Playback ready");
        self.emit(PlaybackEvent::Ready {
            session_id: self.session_id.clone(),
            clip_id: first.id.clone(),
        });
        Ok(())
    }

    /// Moves to the next clip.
    ///
    /// The standby surface is started before anything else changes; only once
    /// it plays do the cursor and active surface flip. A standby that failed
    /// to preload earlier is loaded on demand first. If it cannot be started
    /// after the configured attempts, the current clip keeps playing and the
    /// error is returned.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn advance(&self) -> Result<AdvanceOutcome> {
        let Some(_busy) = BusyGuard::try_acquire(&self.busy) else {
            // The flag is shared with a running `initialize`.
            if self.state.lock().phase == CoordinatorPhase::Initializing {
                return Err(PlaybackError::InvalidState {
                    operation: "advance",
                    phase: CoordinatorPhase::Initializing.to_string(),
                });
            }
            debug!("Advance already in flight; ignoring tap");
            return Ok(AdvanceOutcome::Ignored);
        };

        let (cursor, active) = {
            let mut state = self.state.lock();
            match state.phase {
                CoordinatorPhase::Ready => {}
                CoordinatorPhase::Finished => return Ok(AdvanceOutcome::Ignored),
                CoordinatorPhase::Closed => return Err(PlaybackError::SessionClosed),
                phase => {
                    return Err(PlaybackError::InvalidState {
                        operation: "advance",
                        phase: phase.to_string(),
                    })
                }
            }

            if state.cursor + 1 >= self.playlist.len() {
                state.phase = CoordinatorPhase::Finished;
            } else {
                state.phase = CoordinatorPhase::Advancing;
            }
            (state.cursor, state.active)
        };
        let _scope = AdvanceScope(self);
        self.publish();

        let next = cursor + 1;
        if next >= self.playlist.len() {
            return Ok(self.finish());
        }

        let standby = active.other();
        let next_clip = &self.playlist[next];
        debug!(cursor, next, standby = %standby, "Advancing");

        // Left running by an advance dropped between swap and stop.
        if self.surface(standby).phase() == SurfacePhase::Playing {
            if let Err(err) = self.surface(standby).stop().await {
                warn!(surface = %standby, error = %err, "Failed to stop standby surface");
            }
            if self.cancel.is_cancelled() {
                return Ok(AdvanceOutcome::Cancelled);
            }
        }

        // A preload that failed earlier is retried now that the clip is due.
        if !self.surface(standby).holds_ready(next_clip) {
            warn!(clip_id = %next_clip.id, "Standby not ready; loading on demand");
            let loaded = self.surface(standby).load(next_clip).await;
            if self.cancel.is_cancelled() {
                return Ok(AdvanceOutcome::Cancelled);
            }
            if let Err(err) = loaded {
                return Err(self.abort_advance(err));
            }
        }

        let played = self.play_with_retry(standby).await;
        if self.cancel.is_cancelled() {
            return Ok(AdvanceOutcome::Cancelled);
        }
        if let Err(err) = played {
            return Err(self.abort_advance(err));
        }

        {
            let mut state = self.state.lock();
            if state.phase != CoordinatorPhase::Advancing {
                return Ok(AdvanceOutcome::Cancelled);
            }
            state.cursor = next;
            state.active = standby;
        }
        self.publish();
        self.emit(PlaybackEvent::Advanced {
            session_id: self.session_id.clone(),
            cursor: next,
            clip_id: next_clip.id.clone(),
            active_surface: standby.as_u8(),
        });

        let stopped = self.surface(active).stop().await;
        if self.cancel.is_cancelled() {
            return Ok(AdvanceOutcome::Cancelled);
        }
        if let Err(err) = stopped {
            warn!(surface = %active, error = %err, "Failed to stop previous surface");
        }

        match self.playlist.get(next + 1) {
            Some(future_clip) => {
                let preloaded = self.surface(active).load(future_clip).await;
                if self.cancel.is_cancelled() {
                    return Ok(AdvanceOutcome::Cancelled);
                }
                if let Err(err) = preloaded {
                    warn!(clip_id = %future_clip.id, error = %err, "Preload deferred");
                    self.emit(PlaybackEvent::PreloadDeferred {
                        session_id: self.session_id.clone(),
                        clip_id: future_clip.id.clone(),
                        message: err.to_string(),
                    });
                }
            }
            None => {
                let unloaded = self.surface(active).unload().await;
                if self.cancel.is_cancelled() {
                    return Ok(AdvanceOutcome::Cancelled);
                }
                if let Err(err) = unloaded {
                    warn!(surface = %active, error = %err, "Failed to unload previous surface");
                }
            }
        }

        {
            let mut state = self.state.lock();
            if state.phase != CoordinatorPhase::Advancing {
                return Ok(AdvanceOutcome::Cancelled);
            }
            state.phase = CoordinatorPhase::Ready;
        }
        self.publish();

        info!(cursor = next, clip_id = %next_clip.id, "Advanced");
        Ok(AdvanceOutcome::Advanced {
            cursor: next,
            active_surface: standby,
        })
    }

    /// Leaves the session immediately, from any phase.
    ///
    /// Cancels pending work and closes both surfaces; host resources stay
    /// allocated until [`shutdown`](Self::shutdown) or host teardown. Before
    /// the end of the playlist the exit callback is discarded without being
    /// called.
    pub fn exit(&self) {
        let closed_at = {
            let mut state = self.state.lock();
            match state.phase {
                CoordinatorPhase::Closed => None,
                CoordinatorPhase::Finished => Some(None),
                _ => {
                    state.phase = CoordinatorPhase::Closed;
                    Some(Some(state.cursor))
                }
            }
        };
        let Some(closed_at) = closed_at else {
            return;
        };

        self.cancel.cancel();
        for surface in &self.surfaces {
            surface.close();
        }

        // A finished session still owes its callback to the finishing advance.
        if let Some(cursor) = closed_at {
            self.on_exit.lock().take();
            self.publish();
            info!(session_id = %self.session_id, cursor, "Playback session closed");
            self.emit(PlaybackEvent::Closed {
                session_id: self.session_id.clone(),
                cursor,
            });
        }
    }

    /// Exits and releases host resources of both surfaces.
    pub async fn shutdown(&self) {
        self.exit();
        let (first, second) =
            futures::join!(self.surfaces[0].release(), self.surfaces[1].release());
        for result in [first, second] {
            if let Err(err) = result {
                warn!(session_id = %self.session_id, error = %err, "Surface release failed");
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token cancelled when the session exits.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn surface(&self, id: SurfaceId) -> &ClipSurface {
        &self.surfaces[id.index()]
    }

    fn play_options(&self) -> PlayOptions {
        PlayOptions {
            looping: self.config.looping,
        }
    }

    async fn preload(
        &self,
        id: SurfaceId,
        clip: &ClipRef,
        loaded: &AtomicCount,
        total: usize,
    ) -> Result<()> {
        if !self.surface(id).holds_ready(clip) {
            self.surface(id).load(clip).await?;
        }
        let done = loaded.increment();
        self.set_progress((done * 100 / total) as u8);
        Ok(())
    }

    async fn play_with_retry(&self, id: SurfaceId) -> Result<()> {
        let attempts = self.config.play_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.surface(id).play(self.play_options()).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(surface = %id, attempt, "Play succeeded on retry");
                    }
                    return Ok(());
                }
                Err(PlaybackError::SessionClosed) => return Err(PlaybackError::SessionClosed),
                Err(err) if attempt >= attempts => return Err(err),
                Err(err) => {
                    warn!(surface = %id, attempt, attempts, error = %err, "Play failed; retrying");
                    if !self.config.retry_delay.is_zero() {
                        core_async::sleep(self.config.retry_delay).await;
                    }
                    if self.cancel.is_cancelled() {
                        return Err(PlaybackError::SessionClosed);
                    }
                }
            }
        }
    }

    fn set_progress(&self, percent: u8) {
        let percent = percent.min(100);
        let changed = {
            let mut state = self.state.lock();
            if percent > state.progress && state.phase == CoordinatorPhase::Initializing {
                state.progress = percent;
                true
            } else {
                false
            }
        };

        if changed {
            self.publish();
            self.emit(PlaybackEvent::Progress {
                session_id: self.session_id.clone(),
                percent,
            });
        }
    }

    fn start_failed(&self, err: PlaybackError) -> PlaybackError {
        error!(error = %err, "Playback session failed to start");
        self.report(&err);
        PlaybackError::StartFailed(Box::new(err))
    }

    /// Returns to `Ready` on the current clip after a failed advance.
    fn abort_advance(&self, err: PlaybackError) -> PlaybackError {
        {
            let mut state = self.state.lock();
            if state.phase == CoordinatorPhase::Advancing {
                state.phase = CoordinatorPhase::Ready;
            }
        }
        self.publish();
        error!(error = %err, "Advance failed; staying on current clip");
        self.report(&err);
        err
    }

    fn finish(&self) -> AdvanceOutcome {
        let clips = self.playlist.len();
        info!(clips, "Playlist finished");
        self.emit(PlaybackEvent::Finished {
            session_id: self.session_id.clone(),
            clips_played: clips,
        });

        let callback = self.on_exit.lock().take();
        if let Some(callback) = callback {
            callback();
        }
        AdvanceOutcome::Finished
    }

    fn report(&self, err: &PlaybackError) {
        self.emit(PlaybackEvent::Error {
            session_id: self.session_id.clone(),
            clip_id: err.clip_id().map(str::to_string),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Playback(event)).ok();
        }
    }

    fn publish(&self) {
        let snapshot = {
            let state = self.state.lock();
            Self::project(&self.session_id, self.playlist.len(), &state)
        };
        self.snapshot_tx.send_replace(snapshot);
    }

    fn project(session_id: &str, clip_count: usize, state: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session_id.to_string(),
            phase: state.phase,
            cursor: state.cursor,
            clip_count,
            active_surface: state.active,
            ready: state.ready,
            progress: state.progress,
        }
    }
}

impl fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("session_id", &self.session_id)
            .field("state", &*self.state.lock())
            .field("surfaces", &self.surfaces)
            .finish()
    }
}

/// Completed-load counter shared by the two concurrent initial preloads.
#[derive(Default)]
struct AtomicCount(std::sync::atomic::AtomicUsize);

impl AtomicCount {
    fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_is_exclusive_and_resets() {
        let flag = AtomicBool::new(false);

        let guard = BusyGuard::try_acquire(&flag).unwrap();
        assert!(BusyGuard::try_acquire(&flag).is_none());
        drop(guard);

        assert!(BusyGuard::try_acquire(&flag).is_some());
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(CoordinatorPhase::Advancing.to_string(), "advancing");
        assert_eq!(CoordinatorPhase::Closed.to_string(), "closed");
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = SessionSnapshot {
            session_id: "s".to_string(),
            phase: CoordinatorPhase::Ready,
            cursor: 1,
            clip_count: 3,
            active_surface: SurfaceId::One,
            ready: true,
            progress: 100,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["active_surface"], "One");
        assert_eq!(json["cursor"], 1);
    }
}
