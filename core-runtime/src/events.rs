//! # Event Bus System
//!
//! Typed, broadcast-based notifications between the core modules and the host.
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain wrapped by [`CoreEvent`]
//! - **EventBus**: central broadcast channel for publishing events
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ```text
//! ┌──────────────────┐   emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ PlaybackCoord.   ├─────────>│           ├────────────>│ Host UI    │
//! └──────────────────┘          │ EventBus  │             └────────────┘
//! ┌──────────────────┐   emit   │           │  subscribe  ┌────────────┐
//! │ Step library     ├─────────>│           ├────────────>│ Telemetry  │
//! └──────────────────┘          └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # core_async::runtime::block_on(async {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Progress {
//!     session_id: "s-1".to_string(),
//!     percent: 50,
//! }))
//! .ok();
//!
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Playback(_))));
//! # });
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep reading.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`, which publishers ignore.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback session events
    Playback(PlaybackEvent),
    /// Step list events
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::PreloadDeferred { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Ready { .. })
            | CoreEvent::Playback(PlaybackEvent::Finished { .. }) => EventSeverity::Info,
            CoreEvent::Library(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by a playback session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Session created; the initial preload is starting.
    Initializing {
        session_id: String,
        clip_count: usize,
    },
    /// Initial preload progress (0-100, never decreases).
    Progress { session_id: String, percent: u8 },
    /// First clip is playing; taps are now accepted.
    Ready { session_id: String, clip_id: String },
    /// Cursor moved to a new clip.
    Advanced {
        session_id: String,
        /// Zero-based playlist position now on screen.
        cursor: usize,
        clip_id: String,
        /// Surface (0 or 1) now visible.
        active_surface: u8,
    },
    /// Preloading an upcoming clip failed; retried when it becomes the target.
    PreloadDeferred {
        session_id: String,
        clip_id: String,
        message: String,
    },
    /// The last clip was advanced past.
    Finished {
        session_id: String,
        clips_played: usize,
    },
    /// The user left the session before the end.
    Closed { session_id: String, cursor: usize },
    /// A playback error was reported to the host.
    Error {
        session_id: String,
        clip_id: Option<String>,
        message: String,
        /// Whether the session is still usable.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Initializing { .. } => "Playback session initializing",
            PlaybackEvent::Progress { .. } => "Initial preload in progress",
            PlaybackEvent::Ready { .. } => "Playback ready",
            PlaybackEvent::Advanced { .. } => "Advanced to next clip",
            PlaybackEvent::PreloadDeferred { .. } => "Clip preload deferred",
            PlaybackEvent::Finished { .. } => "Playlist finished",
            PlaybackEvent::Closed { .. } => "Playback session closed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }

    /// Session the event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            PlaybackEvent::Initializing { session_id, .. }
            | PlaybackEvent::Progress { session_id, .. }
            | PlaybackEvent::Ready { session_id, .. }
            | PlaybackEvent::Advanced { session_id, .. }
            | PlaybackEvent::PreloadDeferred { session_id, .. }
            | PlaybackEvent::Finished { session_id, .. }
            | PlaybackEvent::Closed { session_id, .. }
            | PlaybackEvent::Error { session_id, .. } => session_id,
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to the ordered step list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A clip was imported and appended as a new step.
    StepAdded {
        step_id: String,
        step_number: u32,
        filename: String,
    },
    /// The step list was cleared.
    StepsReset {
        /// Number of steps that were removed.
        removed: usize,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::StepAdded { .. } => "Step added",
            LibraryEvent::StepsReset { .. } => "Steps reset",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus shares the same channel. Each `subscribe()` creates an
/// independent receiver that only sees events emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let playback_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once all senders are dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching event is buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every matching event currently buffered.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
