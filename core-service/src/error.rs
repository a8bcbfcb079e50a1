use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Step storage unavailable: {0}")]
    Storage(#[source] core_library::LibraryError),

    #[error("No steps recorded yet")]
    NoSteps,

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

impl From<core_runtime::Error> for CoreError {
    fn from(err: core_runtime::Error) -> Self {
        match err {
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => CoreError::CapabilityMissing {
                capability,
                message,
            },
            other => CoreError::InitializationFailed(other.to_string()),
        }
    }
}

impl CoreError {
    /// Whether the host can recover by retrying or navigating back.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoreError::Storage(_) | CoreError::NoSteps | CoreError::Library(_) => true,
            CoreError::Playback(err) => err.is_recoverable(),
            CoreError::InitializationFailed(_) | CoreError::CapabilityMissing { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
