//! # Playback Error Types
//!
//! Error types for clip surfaces, the coordinator and playlist construction.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Surface Errors
    // ========================================================================
    /// A clip failed to open or decode on a surface.
    #[error("Failed to load clip {clip_id}: {source}")]
    Load {
        clip_id: String,
        #[source]
        source: BridgeError,
    },

    /// A loaded clip failed to start playing.
    #[error("Failed to play clip {clip_id}: {source}")]
    Play {
        clip_id: String,
        #[source]
        source: BridgeError,
    },

    /// Stop or unload was rejected by the host.
    #[error("Surface operation failed: {0}")]
    Surface(#[from] BridgeError),

    /// Command issued in a phase that does not allow it.
    #[error("Cannot {operation} while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The initial dual preload or first play did not complete.
    #[error("Playback session failed to start: {0}")]
    StartFailed(#[source] Box<PlaybackError>),

    /// The session was exited; the command never reached the host.
    #[error("Playback session closed")]
    SessionClosed,

    /// The step list could not be read.
    #[error("Step storage error: {0}")]
    Storage(String),

    // ========================================================================
    // Playlist Errors
    // ========================================================================
    /// Playlist construction received no clips.
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Playlist construction received inconsistent clips.
    #[error("Invalid playlist: {0}")]
    InvalidPlaylist(String),

    /// Playback configuration is out of range.
    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// Returns `true` if the session stays usable after this error.
    ///
    /// Load and play failures leave the current clip on screen, and a failed
    /// start can be retried with another `initialize` call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::Load { .. }
                | PlaybackError::Play { .. }
                | PlaybackError::Surface(_)
                | PlaybackError::InvalidState { .. }
                | PlaybackError::StartFailed(_)
        )
    }

    /// Clip the error refers to, if any.
    pub fn clip_id(&self) -> Option<&str> {
        match self {
            PlaybackError::Load { clip_id, .. } | PlaybackError::Play { clip_id, .. } => {
                Some(clip_id)
            }
            PlaybackError::StartFailed(inner) => inner.clip_id(),
            _ => None,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let load = PlaybackError::Load {
            clip_id: "step-2".to_string(),
            source: BridgeError::Media("decoder refused".to_string()),
        };
        assert!(load.is_recoverable());
        assert_eq!(load.clip_id(), Some("step-2"));

        let start = PlaybackError::StartFailed(Box::new(load));
        assert!(start.is_recoverable());
        assert_eq!(start.clip_id(), Some("step-2"));
        assert!(start.to_string().contains("decoder refused"));

        assert!(!PlaybackError::SessionClosed.is_recoverable());
        assert!(!PlaybackError::EmptyPlaylist.is_recoverable());
        assert!(!PlaybackError::Storage("disk".to_string()).is_recoverable());
    }
}
