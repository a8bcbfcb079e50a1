//! End-to-end flows through the service façade: import, start, tap, exit.

use async_trait::async_trait;
use bridge_desktop::{SqliteSettingsStore, TokioFileSystem};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::SettingsStore;
use bridge_traits::surface::{LoadRequest, MediaSurface, PlayOptions};
use core_library::LibraryError;
use core_playback::{AdvanceOutcome, CoordinatorPhase, PlaybackConfig, PlaybackError};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, LibraryEvent, PlaybackEvent};
use core_service::{CoreError, CoreService};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingSurface {
    ops: Mutex<Vec<String>>,
    broken: bool,
}

impl RecordingSurface {
    fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }
}

#[async_trait]
impl MediaSurface for RecordingSurface {
    async fn load(&self, request: &LoadRequest) -> BridgeResult<()> {
        self.ops.lock().push(format!("load:{}", request.clip_id));
        if self.broken {
            return Err(BridgeError::Media("decoder unavailable".to_string()));
        }
        Ok(())
    }

    async fn play(&self, _options: PlayOptions) -> BridgeResult<()> {
        self.ops.lock().push("play".to_string());
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.ops.lock().push("stop".to_string());
        Ok(())
    }

    async fn unload(&self) -> BridgeResult<()> {
        self.ops.lock().push("unload".to_string());
        Ok(())
    }
}

struct Fixture {
    dir: TempDir,
    store: Arc<SqliteSettingsStore>,
    service: CoreService,
}

impl Fixture {
    fn picked(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("picked").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, name.as_bytes()).unwrap();
        path
    }
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
    let config = CoreConfig::builder()
        .data_dir(dir.path().join("data"))
        .settings_store(store.clone())
        .file_system(Arc::new(TokioFileSystem::with_data_directory(
            dir.path().join("data"),
        )))
        .build()
        .unwrap();
    let service = CoreService::new(config).unwrap();
    Fixture {
        dir,
        store,
        service,
    }
}

fn fast() -> PlaybackConfig {
    PlaybackConfig::default().with_retry_delay(Duration::ZERO)
}

fn surfaces() -> (Arc<RecordingSurface>, Arc<RecordingSurface>) {
    (
        Arc::new(RecordingSurface::default()),
        Arc::new(RecordingSurface::default()),
    )
}

#[core_async::test]
async fn test_start_without_steps_fails() {
    let f = fixture().await;
    let (a, b) = surfaces();

    let result = f.service.start_session([a.clone(), b], fast(), || {}).await;

    assert!(matches!(result, Err(CoreError::NoSteps)));
    assert!(a.ops().is_empty());
}

#[core_async::test]
async fn test_import_then_play_through() {
    let f = fixture().await;
    let mut events = f.service.subscribe_events();
    for name in ["one.mp4", "two.mp4", "three.mp4"] {
        let picked = f.picked(name);
        f.service.import_clip(&picked).await.unwrap();
    }
    assert_eq!(f.service.ordered_steps().await.unwrap().len(), 3);

    let exits = Arc::new(AtomicUsize::new(0));
    let counter = exits.clone();
    let (a, b) = surfaces();
    let session = f
        .service
        .start_session([a.clone(), b.clone()], fast(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert!(session.coordinator().snapshot().ready);
    assert!(session.presentation().frame().tap_region.enabled);

    let layer = session.presentation();
    assert!(matches!(layer.tap().await.unwrap(), AdvanceOutcome::Advanced { cursor: 1, .. }));
    assert!(matches!(layer.tap().await.unwrap(), AdvanceOutcome::Advanced { cursor: 2, .. }));
    assert_eq!(layer.tap().await.unwrap(), AdvanceOutcome::Finished);
    assert_eq!(exits.load(Ordering::SeqCst), 1);

    assert_eq!(a.ops().iter().filter(|op| op.starts_with("load:")).count(), 2);
    assert_eq!(b.ops().last().map(String::as_str), Some("unload"));

    let seen = events.drain();
    let added = seen
        .iter()
        .filter(|e| matches!(e, CoreEvent::Library(LibraryEvent::StepAdded { .. })))
        .count();
    assert_eq!(added, 3);
    assert!(seen
        .iter()
        .any(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::Finished { clips_played: 3, .. }))));
}

#[core_async::test]
async fn test_corrupt_storage_is_storage_error() {
    let f = fixture().await;
    f.store.set_string("steplay.steps", "[{").await.unwrap();
    let (a, b) = surfaces();

    let result = f.service.start_session([a, b], fast(), || {}).await;

    match result {
        Err(err @ CoreError::Storage(LibraryError::Corrupt(_))) => assert!(err.is_recoverable()),
        other => panic!("expected storage error, got {:?}", other.err()),
    }
}

#[core_async::test]
async fn test_start_failure_releases_surfaces() {
    let f = fixture().await;
    let picked = f.picked("only.mp4");
    f.service.import_clip(&picked).await.unwrap();
    let a = Arc::new(RecordingSurface::broken());
    let b = Arc::new(RecordingSurface::default());

    let result = f.service.start_session([a.clone(), b.clone()], fast(), || {}).await;

    match result {
        Err(err @ CoreError::Playback(PlaybackError::StartFailed(_))) => {
            assert!(err.is_recoverable())
        }
        other => panic!("expected start failure, got {:?}", other.err()),
    }
    assert!(!a.ops().contains(&"play".to_string()));
    assert!(b.ops().is_empty());
}

#[core_async::test]
async fn test_exit_mid_session_skips_callback() {
    let f = fixture().await;
    for name in ["a.mp4", "b.mp4"] {
        let picked = f.picked(name);
        f.service.import_clip(&picked).await.unwrap();
    }
    let exits = Arc::new(AtomicUsize::new(0));
    let counter = exits.clone();
    let (a, b) = surfaces();

    let session = f
        .service
        .start_session([a, b], fast(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();
    let (coordinator, layer) = session.into_parts();

    coordinator.exit();

    assert_eq!(coordinator.snapshot().phase, CoordinatorPhase::Closed);
    assert_eq!(layer.tap().await.unwrap(), AdvanceOutcome::Ignored);
    assert_eq!(exits.load(Ordering::SeqCst), 0);
}

#[core_async::test]
async fn test_reset_empties_list() {
    let f = fixture().await;
    let picked = f.picked("a.mp4");
    f.service.import_clip(&picked).await.unwrap();

    assert_eq!(f.service.reset_steps().await.unwrap(), 1);
    assert!(matches!(f.service.load_playlist().await, Err(CoreError::NoSteps)));
}

#[cfg(feature = "desktop-shims")]
#[core_async::test]
async fn test_desktop_bootstrap_persists_steps() {
    let dir = TempDir::new().unwrap();
    let picked = dir.path().join("clip.mp4");
    std::fs::write(&picked, b"clip").unwrap();

    let service = core_service::bootstrap_desktop(dir.path().join("app")).unwrap();
    let step = service.import_clip(&picked).await.unwrap();
    drop(service);

    let reopened = core_service::bootstrap_desktop(dir.path().join("app")).unwrap();
    let steps = reopened.ordered_steps().await.unwrap();
    assert_eq!(steps, vec![step]);
}
