//! Scriptable in-memory media surfaces shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::surface::{LoadRequest, MediaSurface, PlayOptions};
use core_async::sync::Notify;
use core_playback::{ClipRef, PlaybackConfig, PlaybackCoordinator, Playlist};
use std::collections::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A pause point inside a host call.
///
/// `entered` is notified when the call reaches the gate; the call then
/// waits until `release` is notified.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct Script {
    play_failures: u32,
    stop_fails: bool,
    load_failures: HashMap<String, u32>,
    load_gates: HashMap<String, Arc<Gate>>,
    play_gate: Option<Arc<Gate>>,
}

/// Host log shared by both surfaces; entries look like `s1:load:step-2`.
#[derive(Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<String>>>);

impl OpLog {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.entries().iter().filter(|e| e.contains(needle)).count()
    }
}

pub struct FakeSurface {
    name: &'static str,
    log: OpLog,
    script: Mutex<Script>,
}

impl FakeSurface {
    pub fn new(name: &'static str, log: OpLog) -> Self {
        Self {
            name,
            log,
            script: Mutex::new(Script::default()),
        }
    }

    /// The next `times` play calls fail.
    pub fn fail_play(&self, times: u32) {
        self.script.lock().play_failures = times;
    }

    pub fn fail_stop(&self) {
        self.script.lock().stop_fails = true;
    }

    /// The next `times` loads of `clip_id` fail.
    pub fn fail_load(&self, clip_id: &str, times: u32) {
        self.script
            .lock()
            .load_failures
            .insert(clip_id.to_string(), times);
    }

    pub fn gate_load(&self, clip_id: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script
            .lock()
            .load_gates
            .insert(clip_id.to_string(), gate.clone());
        gate
    }

    pub fn gate_play(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script.lock().play_gate = Some(gate.clone());
        gate
    }

    fn record(&self, op: &str) {
        self.log.push(format!("{}:{}", self.name, op));
    }
}

#[async_trait]
impl MediaSurface for FakeSurface {
    async fn load(&self, request: &LoadRequest) -> Result<()> {
        self.record(&format!("load:{}", request.clip_id));

        let (gate, fail) = {
            let mut script = self.script.lock();
            let gate = script.load_gates.remove(&request.clip_id);
            let fail = match script.load_failures.get_mut(&request.clip_id) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };
            (gate, fail)
        };

        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if fail {
            Err(BridgeError::Media(format!("cannot decode {}", request.clip_id)))
        } else {
            Ok(())
        }
    }

    async fn play(&self, options: PlayOptions) -> Result<()> {
        self.record(if options.looping { "play" } else { "play-once" });

        let (gate, fail) = {
            let mut script = self.script.lock();
            let gate = script.play_gate.take();
            let fail = script.play_failures > 0;
            if fail {
                script.play_failures -= 1;
            }
            (gate, fail)
        };

        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if fail {
            Err(BridgeError::Media("output unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    async fn stop(&self) -> Result<()> {
        self.record("stop");
        if self.script.lock().stop_fails {
            Err(BridgeError::Media("stop rejected".to_string()))
        } else {
            Ok(())
        }
    }

    async fn unload(&self) -> Result<()> {
        self.record("unload");
        Ok(())
    }
}

/// Two fake surfaces over one shared log.
pub struct FakeHost {
    pub log: OpLog,
    pub s0: Arc<FakeSurface>,
    pub s1: Arc<FakeSurface>,
}

impl FakeHost {
    pub fn new() -> Self {
        let log = OpLog::default();
        Self {
            s0: Arc::new(FakeSurface::new("s0", log.clone())),
            s1: Arc::new(FakeSurface::new("s1", log.clone())),
            log,
        }
    }

    pub fn surfaces(&self) -> [Arc<dyn MediaSurface>; 2] {
        [self.s0.clone(), self.s1.clone()]
    }
}

pub fn clips(count: u32) -> Vec<ClipRef> {
    (1..=count)
        .map(|n| ClipRef::new(format!("step-{}", n), n, format!("/data/clips/{}.mp4", n)))
        .collect()
}

pub fn playlist(count: u32) -> Playlist {
    Playlist::new(clips(count)).expect("valid playlist")
}

/// Config without retry delays so tests stay fast.
pub fn fast_config() -> PlaybackConfig {
    PlaybackConfig::default().with_retry_delay(Duration::ZERO)
}

/// Counts exit callback invocations.
#[derive(Clone, Default)]
pub struct ExitCounter(Arc<Mutex<u32>>);

impl ExitCounter {
    pub fn callback(&self) -> impl FnOnce() + Send + 'static {
        let counter = self.0.clone();
        move || *counter.lock() += 1
    }

    pub fn count(&self) -> u32 {
        *self.0.lock()
    }
}

pub fn coordinator(host: &FakeHost, count: u32, exits: &ExitCounter) -> Arc<PlaybackCoordinator> {
    Arc::new(
        PlaybackCoordinator::new(playlist(count), host.surfaces(), fast_config())
            .expect("valid config")
            .with_exit_callback(exits.callback()),
    )
}
