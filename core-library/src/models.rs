//! # Step Models
//!
//! Persisted shape of one recorded or imported step clip.

use bridge_traits::surface::MediaSource;
use core_playback::ClipRef;
use serde::{Deserialize, Serialize};

/// One entry of the stored step list.
///
/// Serialized as `{ "id", "stepNumber", "uri", "filename" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// 1-based position, assigned on append
    pub step_number: u32,
    /// Durable location of the clip data
    pub uri: String,
    /// Display name, usually the picked file's name
    pub filename: String,
}

impl StepRecord {
    /// Create a record with a fresh id
    pub fn new(step_number: u32, uri: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            step_number,
            uri: uri.into(),
            filename: filename.into(),
        }
    }

    /// Validate step data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Step id cannot be empty".to_string());
        }

        if self.step_number == 0 {
            return Err("Step number must be positive".to_string());
        }

        if self.uri.trim().is_empty() {
            return Err("Step uri cannot be empty".to_string());
        }

        if MediaSource::from_locator(&self.uri).is_remote() {
            return Err(format!("Step uri {} is not local", self.uri));
        }

        Ok(())
    }

    /// Playback reference for this step.
    pub fn to_clip_ref(&self) -> ClipRef {
        ClipRef::new(self.id.clone(), self.step_number, self.uri.clone())
    }
}
