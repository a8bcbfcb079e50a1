//! # Playlist Model
//!
//! The ordered, immutable clip sequence a session plays through.

use crate::error::{PlaybackError, Result};
use bridge_traits::surface::{LoadRequest, MediaSource};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Reference to one already-imported clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipRef {
    /// Opaque identifier
    pub id: String,
    /// 1-based position assigned when the clip was added
    pub sequence_number: u32,
    /// Path or URI of the durable media data
    pub locator: String,
}

impl ClipRef {
    pub fn new(id: impl Into<String>, sequence_number: u32, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence_number,
            locator: locator.into(),
        }
    }

    /// Host-facing media source for this clip.
    pub fn media_source(&self) -> MediaSource {
        MediaSource::from_locator(&self.locator)
    }

    /// Load command handed to a surface.
    pub fn load_request(&self) -> LoadRequest {
        LoadRequest::new(self.id.clone(), self.media_source())
    }
}

/// Ordered clip sequence, indexed `0..len()`.
///
/// Construction enforces that the playlist is non-empty, that sequence
/// numbers are positive and strictly increasing, and that every locator
/// points at local data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    clips: Vec<ClipRef>,
}

impl Playlist {
    pub fn new(clips: Vec<ClipRef>) -> Result<Self> {
        if clips.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }

        let mut previous: Option<u32> = None;
        for (index, clip) in clips.iter().enumerate() {
            if clip.id.trim().is_empty() {
                return Err(PlaybackError::InvalidPlaylist(format!(
                    "clip at position {} has an empty id",
                    index
                )));
            }

            if clip.locator.trim().is_empty() {
                return Err(PlaybackError::InvalidPlaylist(format!(
                    "clip {} has an empty locator",
                    clip.id
                )));
            }

            if clip.media_source().is_remote() {
                return Err(PlaybackError::InvalidPlaylist(format!(
                    "clip {} points at a remote resource",
                    clip.id
                )));
            }

            if clip.sequence_number == 0 {
                return Err(PlaybackError::InvalidPlaylist(format!(
                    "clip {} has sequence number 0",
                    clip.id
                )));
            }

            if let Some(prev) = previous {
                if clip.sequence_number <= prev {
                    return Err(PlaybackError::InvalidPlaylist(format!(
                        "sequence number {} of clip {} does not follow {}",
                        clip.sequence_number, clip.id, prev
                    )));
                }
            }
            previous = Some(clip.sequence_number);
        }

        Ok(Self { clips })
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ClipRef> {
        self.clips.get(index)
    }

    /// Whether `index` is the final position.
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.clips.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClipRef> {
        self.clips.iter()
    }

    pub fn clips(&self) -> &[ClipRef] {
        &self.clips
    }
}

impl Index<usize> for Playlist {
    type Output = ClipRef;

    fn index(&self, index: usize) -> &ClipRef {
        &self.clips[index]
    }
}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a ClipRef;
    type IntoIter = std::slice::Iter<'a, ClipRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.clips.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(seq: u32) -> ClipRef {
        ClipRef::new(format!("step-{}", seq), seq, format!("/data/clips/{}.mp4", seq))
    }

    #[test]
    fn test_accepts_increasing_sequence() {
        let playlist = Playlist::new(vec![clip(1), clip(2), clip(5)]).unwrap();

        assert_eq!(playlist.len(), 3);
        assert!(!playlist.is_empty());
        assert_eq!(playlist[2].sequence_number, 5);
        assert!(playlist.is_last(2));
        assert!(!playlist.is_last(0));
        assert_eq!(playlist.iter().count(), 3);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            Playlist::new(Vec::new()),
            Err(PlaybackError::EmptyPlaylist)
        ));
    }

    #[test]
    fn test_rejects_zero_and_out_of_order() {
        assert!(matches!(
            Playlist::new(vec![clip(0)]),
            Err(PlaybackError::InvalidPlaylist(_))
        ));
        assert!(matches!(
            Playlist::new(vec![clip(2), clip(1)]),
            Err(PlaybackError::InvalidPlaylist(_))
        ));
        assert!(matches!(
            Playlist::new(vec![clip(1), clip(1)]),
            Err(PlaybackError::InvalidPlaylist(_))
        ));
    }

    #[test]
    fn test_rejects_remote_and_blank_locators() {
        for locator in [
            "https://cdn.example.com/a.mp4",
            "rtsp://cam.example.com/live",
            "ftp://files.example.com/a.mp4",
        ] {
            let remote = ClipRef::new("a", 1, locator);
            assert!(
                matches!(Playlist::new(vec![remote]), Err(PlaybackError::InvalidPlaylist(_))),
                "{}",
                locator
            );
        }

        let blank = ClipRef::new("a", 1, "  ");
        assert!(Playlist::new(vec![blank]).is_err());

        let no_id = ClipRef::new("", 1, "/a.mp4");
        assert!(Playlist::new(vec![no_id]).is_err());
    }

    #[test]
    fn test_load_request_uses_clip_id() {
        let request = clip(3).load_request();
        assert_eq!(request.clip_id, "step-3");
        assert!(matches!(request.source, MediaSource::LocalFile { .. }));
    }
}
