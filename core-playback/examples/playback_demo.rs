//! # Step Playback Example
//!
//! Drives a three-clip session over two console "surfaces" that print the
//! commands they receive, tapping through to the end of the playlist.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::surface::{LoadRequest, MediaSurface, PlayOptions};
use core_async::time::{sleep, Duration};
use core_playback::{
    AdvanceOutcome, ClipRef, PlaybackConfig, PlaybackCoordinator, PlaybackError,
    PresentationLayer, Playlist,
};
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;

// ============================================================================
// Console Surface (stands in for a host video view)
// ============================================================================

struct ConsoleSurface {
    name: &'static str,
    decode_time: Duration,
}

#[async_trait]
impl MediaSurface for ConsoleSurface {
    async fn load(&self, request: &LoadRequest) -> BridgeResult<()> {
        sleep(self.decode_time).await;
        println!("  [{}] loaded {} ({:?})", self.name, request.clip_id, request.source);
        Ok(())
    }

    async fn play(&self, options: PlayOptions) -> BridgeResult<()> {
        println!("  [{}] play (looping: {})", self.name, options.looping);
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        println!("  [{}] stop", self.name);
        Ok(())
    }

    async fn unload(&self) -> BridgeResult<()> {
        println!("  [{}] unload", self.name);
        Ok(())
    }
}

fn surfaces() -> [Arc<dyn MediaSurface>; 2] {
    [
        Arc::new(ConsoleSurface {
            name: "surface-0",
            decode_time: Duration::from_millis(40),
        }),
        Arc::new(ConsoleSurface {
            name: "surface-1",
            decode_time: Duration::from_millis(25),
        }),
    ]
}

#[core_async::main]
async fn main() {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact)).ok();

    if let Err(err) = run().await {
        eprintln!("demo failed: {}", err);
    }
}

async fn run() -> Result<(), PlaybackError> {
    let playlist = Playlist::new(vec![
        ClipRef::new("warm-up", 1, "/tmp/steplay/clips/warm-up.mp4"),
        ClipRef::new("lunge", 2, "/tmp/steplay/clips/lunge.mp4"),
        ClipRef::new("stretch", 3, "file:///tmp/steplay/clips/stretch.mp4"),
    ])?;

    let bus = EventBus::new(32);
    let mut events = EventStream::new(bus.subscribe());

    let coordinator = Arc::new(
        PlaybackCoordinator::new(playlist, surfaces(), PlaybackConfig::default())?
            .with_event_bus(bus)
            .with_exit_callback(|| println!("  -> exit callback: leaving playback")),
    );
    let layer = PresentationLayer::new(coordinator.clone());

    println!("Initializing session {}", coordinator.session_id());
    coordinator.initialize().await?;
    print_frame(&layer);

    loop {
        println!("\nTap");
        match layer.tap().await? {
            AdvanceOutcome::Advanced { cursor, .. } => {
                println!("  now showing clip {}", cursor + 1);
                print_frame(&layer);
            }
            AdvanceOutcome::Finished => break,
            outcome => println!("  tap result: {:?}", outcome),
        }
    }

    println!("\nEvents:");
    for event in events.drain() {
        println!("  {}", event.description());
    }

    coordinator.shutdown().await;
    Ok(())
}

fn print_frame(layer: &PresentationLayer) {
    let frame = layer.frame();
    println!(
        "  frame: front={} back={} taps={} progress={}%",
        frame.active_layer().surface,
        frame.layers[0].surface,
        frame.tap_region.enabled,
        frame.progress.percent
    );
}
