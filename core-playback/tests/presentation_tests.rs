//! Presentation layer driven by a live coordinator

mod common;

use common::{coordinator, ExitCounter, FakeHost};
use core_playback::{AdvanceOutcome, CoordinatorPhase, PresentationLayer, SurfaceId};

#[core_async::test]
async fn test_taps_ignored_until_ready() {
    let host = FakeHost::new();
    let exits = ExitCounter::default();
    let layer = PresentationLayer::new(coordinator(&host, 3, &exits));

    let frame = layer.frame();
    assert!(frame.progress.visible);
    assert!(!frame.tap_region.enabled);

    assert_eq!(layer.tap().await.unwrap(), AdvanceOutcome::Ignored);
    assert!(host.log.entries().is_empty());
}

#[core_async::test]
async fn test_frame_follows_active_surface() {
    let host = FakeHost::new();
    let exits = ExitCounter::default();
    let mut layer = PresentationLayer::new(coordinator(&host, 3, &exits));

    layer.coordinator().initialize().await.unwrap();
    let frame = layer.changed().await.unwrap();
    assert_eq!(frame.active_layer().surface, SurfaceId::Zero);
    assert!(frame.tap_region.enabled);
    assert!(!frame.progress.visible);

    let outcome = layer.tap().await.unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Advanced { cursor: 1, .. }));

    let frame = layer.changed().await.unwrap();
    assert_eq!(frame.active_layer().surface, SurfaceId::One);
    assert_eq!(frame.layers[0].surface, SurfaceId::Zero);
    assert!(!frame.layers[0].is_visible());
}

#[core_async::test]
async fn test_tap_through_to_finish() {
    let host = FakeHost::new();
    let exits = ExitCounter::default();
    let layer = PresentationLayer::new(coordinator(&host, 2, &exits));
    layer.coordinator().initialize().await.unwrap();

    assert!(matches!(
        layer.tap().await.unwrap(),
        AdvanceOutcome::Advanced { .. }
    ));
    assert_eq!(layer.tap().await.unwrap(), AdvanceOutcome::Finished);
    assert_eq!(exits.count(), 1);

    let frame = layer.frame();
    assert!(!frame.tap_region.enabled);
    assert_eq!(layer.tap().await.unwrap(), AdvanceOutcome::Ignored);
    assert_eq!(exits.count(), 1);
}

#[core_async::test]
async fn test_exit_disables_taps() {
    let host = FakeHost::new();
    let exits = ExitCounter::default();
    let layer = PresentationLayer::new(coordinator(&host, 3, &exits));
    layer.coordinator().initialize().await.unwrap();

    layer.coordinator().exit();

    assert_eq!(layer.coordinator().snapshot().phase, CoordinatorPhase::Closed);
    assert!(!layer.frame().tap_region.enabled);
    assert_eq!(layer.tap().await.unwrap(), AdvanceOutcome::Ignored);
    assert_eq!(exits.count(), 0);
}
