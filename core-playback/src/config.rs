//! # Playback Configuration
//!
//! Tunables for a playback session.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session configuration.
///
/// Every field has a default, so a partial JSON object deserializes:
///
/// ```
/// use core_playback::PlaybackConfig;
///
/// let config: PlaybackConfig = serde_json::from_str(r#"{"play_attempts": 3}"#).unwrap();
/// assert_eq!(config.play_attempts, 3);
/// assert!(config.looping);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Total `play()` attempts on the standby surface per advance.
    ///
    /// Default: 2 (one retry).
    #[serde(default = "default_play_attempts")]
    pub play_attempts: u32,

    /// Pause between play attempts.
    ///
    /// Default: 50ms.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: Duration,

    /// Loop the active clip until the next tap.
    ///
    /// Default: true.
    #[serde(default = "default_looping")]
    pub looping: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            play_attempts: default_play_attempts(),
            retry_delay: default_retry_delay(),
            looping: default_looping(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_play_attempts(mut self, attempts: u32) -> Self {
        self.play_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.play_attempts == 0 {
            return Err(PlaybackError::InvalidConfig(
                "play_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry_delay > Duration::from_secs(5) {
            return Err(PlaybackError::InvalidConfig(
                "retry_delay exceeds maximum of 5 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_play_attempts() -> u32 {
    2
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_looping() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.play_attempts, 2);
        assert_eq!(config.retry_delay, Duration::from_millis(50));
        assert!(config.looping);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = PlaybackConfig::default().with_play_attempts(0);
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_long_delay() {
        let config = PlaybackConfig::default().with_retry_delay(Duration::from_secs(30));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: PlaybackConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PlaybackConfig::default());
    }
}
