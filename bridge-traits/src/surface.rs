//! Media surface bridge trait and supporting types.
//!
//! A media surface is one independent decode-and-render unit owned by the host
//! (a video view, a texture-backed player, ...). The playback core drives two
//! of them at once and relies on the host to keep them free of cross-talk:
//! loading into one surface must never disturb what the other is showing.

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Location of already-imported media data handed to a host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// File inside app storage, addressed by filesystem path.
    LocalFile { path: PathBuf },
    /// Host-resolvable content URI (e.g. `content://` on Android).
    ContentUri { uri: String },
}

impl MediaSource {
    /// Interpret a persisted locator string.
    ///
    /// `file://` URIs and bare paths become [`MediaSource::LocalFile`];
    /// anything else carrying a scheme is passed through as a content URI.
    pub fn from_locator(locator: &str) -> Self {
        if let Some(path) = strip_scheme(locator, "file") {
            return MediaSource::LocalFile {
                path: PathBuf::from(path),
            };
        }

        if locator.contains("://") {
            MediaSource::ContentUri {
                uri: locator.to_string(),
            }
        } else {
            MediaSource::LocalFile {
                path: PathBuf::from(locator),
            }
        }
    }

    /// Returns `true` if resolving this source could hit the network.
    ///
    /// Only schemes the host resolves from on-device storage count as local.
    pub fn is_remote(&self) -> bool {
        match self {
            MediaSource::LocalFile { .. } => false,
            MediaSource::ContentUri { uri } => match uri.split_once("://") {
                Some((scheme, _)) => !LOCAL_SCHEMES
                    .iter()
                    .any(|local| scheme.eq_ignore_ascii_case(local)),
                None => true,
            },
        }
    }
}

/// URI schemes resolved from on-device storage.
const LOCAL_SCHEMES: &[&str] = &["content", "ph", "assets-library", "android.resource"];

fn strip_scheme<'a>(locator: &'a str, scheme: &str) -> Option<&'a str> {
    let (head, rest) = locator.split_once("://")?;
    head.eq_ignore_ascii_case(scheme).then_some(rest)
}

/// Request to open a clip on a surface without starting playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Opaque clip identifier, for host-side diagnostics.
    pub clip_id: String,
    /// Where the media lives.
    pub source: MediaSource,
}

impl LoadRequest {
    pub fn new(clip_id: impl Into<String>, source: MediaSource) -> Self {
        Self {
            clip_id: clip_id.into(),
            source,
        }
    }
}

/// Options applied when a loaded clip starts playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOptions {
    /// Restart from the beginning when the clip ends instead of holding the
    /// last frame.
    pub looping: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self { looping: true }
    }
}

/// Host media subsystem for a single surface.
///
/// Every method suspends until the host confirms the command. The caller
/// guarantees commands to one surface are never issued concurrently.
#[async_trait]
pub trait MediaSurface: Send + Sync {
    /// Open and decode the clip so that the first frame is ready, paused.
    async fn load(&self, request: &LoadRequest) -> Result<()>;

    /// Start visible/audible playback of the loaded clip.
    async fn play(&self, options: PlayOptions) -> Result<()>;

    /// Halt playback and rewind to the start, keeping decoder resources.
    async fn stop(&self) -> Result<()>;

    /// Release every resource held for the loaded clip.
    async fn unload(&self) -> Result<()>;
}
