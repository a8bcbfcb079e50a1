//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (settings storage,
//! filesystem, media surfaces) into the shared Rust core. Desktop apps
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) so storage bridges are provided automatically; mobile
//! hosts inject their own through [`CoreConfig`].
//!
//! ```ignore
//! let service = CoreService::new(config)?;
//! service.import_clip(Path::new("/picked/jump.mp4")).await?;
//!
//! let session = service
//!     .start_session([front, back], PlaybackConfig::default(), || go_back())
//!     .await?;
//! session.presentation().tap().await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::path::Path;
use std::sync::Arc;

use bridge_traits::{
    storage::{FileSystemAccess, SettingsStore},
    surface::MediaSurface,
};
use core_library::{ClipImporter, LibraryError, SettingsStepRepository, StepRecord, StepRepository};
use core_playback::{PlaybackConfig, PlaybackCoordinator, PlaybackError, Playlist, PresentationLayer};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::{info, instrument, warn};

/// Aggregated handle to all collaborators the core requires.
pub struct CoreDependencies {
    pub settings_store: Arc<dyn SettingsStore>,
    pub filesystem: Arc<dyn FileSystemAccess>,
    pub event_bus: EventBus,
    pub steps: Arc<dyn StepRepository>,
    pub importer: Arc<ClipImporter>,
}

impl CoreDependencies {
    /// Build the dependency bundle from a validated configuration.
    pub fn from_config(config: &CoreConfig) -> Self {
        let event_bus = EventBus::new(config.event_buffer_size);
        let steps: Arc<dyn StepRepository> = Arc::new(
            SettingsStepRepository::new(config.settings_store.clone(), config.steps_key.clone())
                .with_event_bus(event_bus.clone()),
        );
        let importer = Arc::new(ClipImporter::new(
            config.file_system.clone(),
            steps.clone(),
            config.clips_dir_name.clone(),
        ));

        Self {
            settings_store: config.settings_store.clone(),
            filesystem: config.file_system.clone(),
            event_bus,
            steps,
            importer,
        }
    }
}

/// A running playback session: the coordinator and the view bound to it.
pub struct PlaybackSession {
    coordinator: Arc<PlaybackCoordinator>,
    presentation: PresentationLayer,
}

impl PlaybackSession {
    pub fn coordinator(&self) -> &Arc<PlaybackCoordinator> {
        &self.coordinator
    }

    pub fn presentation(&self) -> &PresentationLayer {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut PresentationLayer {
        &mut self.presentation
    }

    pub fn into_parts(self) -> (Arc<PlaybackCoordinator>, PresentationLayer) {
        (self.coordinator, self.presentation)
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
}

impl CoreService {
    /// Create a new service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        info!(steps_key = %config.steps_key, "Core service starting");
        Ok(Self::with_dependencies(CoreDependencies::from_config(&config)))
    }

    /// Create a service around an explicit dependency bundle.
    pub fn with_dependencies(deps: CoreDependencies) -> Self {
        Self {
            deps: Arc::new(deps),
        }
    }

    /// Access the collaborators being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn events(&self) -> &EventBus {
        &self.deps.event_bus
    }

    /// New stream of every core event published from now on.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.deps.event_bus.subscribe())
    }

    /// Stored steps in playback order.
    pub async fn ordered_steps(&self) -> Result<Vec<StepRecord>> {
        Ok(self.deps.steps.get_ordered_steps().await?)
    }

    /// Copy a picked clip into app storage and append it as a step.
    pub async fn import_clip(&self, source: &Path) -> Result<StepRecord> {
        Ok(self.deps.importer.import(source).await?)
    }

    /// Remove every step. Returns how many were removed.
    pub async fn reset_steps(&self) -> Result<usize> {
        Ok(self.deps.steps.reset().await?)
    }

    /// Read the stored steps as a playlist.
    ///
    /// # Errors
    /// - `Storage` if the list cannot be read
    /// - `NoSteps` if nothing has been recorded
    pub async fn load_playlist(&self) -> Result<Playlist> {
        let steps = self
            .deps
            .steps
            .get_ordered_steps()
            .await
            .map_err(CoreError::Storage)?;
        if steps.is_empty() {
            return Err(CoreError::NoSteps);
        }

        let clips = steps.iter().map(StepRecord::to_clip_ref).collect();
        Playlist::new(clips).map_err(|err| match err {
            PlaybackError::EmptyPlaylist => CoreError::NoSteps,
            other => CoreError::Storage(LibraryError::Corrupt(other.to_string())),
        })
    }

    /// Start playing the stored steps on the host's two surfaces.
    ///
    /// Performs the initial preload before returning; `on_exit` runs once
    /// the user taps past the last clip. If the first clip cannot be
    /// started, both surfaces are released and the error is returned so the
    /// host can retry or navigate back.
    #[instrument(skip_all)]
    pub async fn start_session<F>(
        &self,
        surfaces: [Arc<dyn MediaSurface>; 2],
        playback_config: PlaybackConfig,
        on_exit: F,
    ) -> Result<PlaybackSession>
    where
        F: FnOnce() + Send + 'static,
    {
        let playlist = self.load_playlist().await?;
        let clip_count = playlist.len();

        let coordinator = Arc::new(
            PlaybackCoordinator::new(playlist, surfaces, playback_config)?
                .with_event_bus(self.deps.event_bus.clone())
                .with_exit_callback(on_exit),
        );
        let presentation = PresentationLayer::new(coordinator.clone());

        if let Err(err) = coordinator.initialize().await {
            warn!(error = %err, "Playback session failed to start");
            coordinator.shutdown().await;
            return Err(err.into());
        }

        info!(session_id = coordinator.session_id(), clip_count, "Playback session started");
        Ok(PlaybackSession {
            coordinator,
            presentation,
        })
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Stores settings in `<data_dir>/steplay.db` and imported clips under
/// `<data_dir>/clips` using the desktop bridges.
///
/// ```no_run
/// # fn example() -> core_service::Result<()> {
/// let service = core_service::bootstrap_desktop("/home/me/.local/share/steplay")?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(data_dir: impl Into<std::path::PathBuf>) -> Result<CoreService> {
    let data_dir = data_dir.into();
    let config = CoreConfig::builder()
        .database_path(data_dir.join(DESKTOP_DATABASE_NAME))
        .data_dir(data_dir)
        .build()?;
    CoreService::new(config)
}

#[cfg(feature = "desktop-shims")]
const DESKTOP_DATABASE_NAME: &str = "steplay.db";
