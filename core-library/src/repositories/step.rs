//! Step repository trait and settings-store implementation

use crate::error::{LibraryError, Result};
use crate::models::StepRecord;
use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use core_async::sync::Mutex;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Step list repository interface
#[async_trait]
pub trait StepRepository: Send + Sync {
    /// All steps ordered by step number
    ///
    /// # Returns
    /// - `Ok(vec![])` if nothing has been stored yet
    /// - `Err(LibraryError::Corrupt)` if the stored list cannot be read
    async fn get_ordered_steps(&self) -> Result<Vec<StepRecord>>;

    /// Replace the stored list
    ///
    /// # Errors
    /// Returns error if:
    /// - Any step fails validation
    /// - Two steps share a step number
    /// - The underlying store fails
    async fn set_ordered_steps(&self, steps: &[StepRecord]) -> Result<()>;

    /// Append a step after the current last one
    ///
    /// Assigns the next step number and a fresh id.
    async fn append_step(&self, uri: &str, filename: &str) -> Result<StepRecord>;

    /// Remove every step
    ///
    /// # Returns
    /// Number of steps removed
    async fn reset(&self) -> Result<usize>;

    /// Number of stored steps
    async fn count(&self) -> Result<usize> {
        Ok(self.get_ordered_steps().await?.len())
    }
}

/// `StepRepository` persisting a JSON array in a [`SettingsStore`].
pub struct SettingsStepRepository {
    store: Arc<dyn SettingsStore>,
    key: String,
    events: Option<EventBus>,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl SettingsStepRepository {
    pub fn new(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            events: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Publish library events on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn load(&self) -> Result<Vec<StepRecord>> {
        let Some(json) = self.store.get_string(&self.key).await? else {
            return Ok(Vec::new());
        };

        let mut steps: Vec<StepRecord> = serde_json::from_str(&json)
            .map_err(|e| LibraryError::Corrupt(format!("{} is not a step list: {}", self.key, e)))?;

        for step in &steps {
            step.validate()
                .map_err(|message| LibraryError::Corrupt(format!("step {}: {}", step.id, message)))?;
        }

        steps.sort_by_key(|step| step.step_number);
        Ok(steps)
    }

    async fn store(&self, steps: &[StepRecord]) -> Result<()> {
        let json = serde_json::to_string(steps)?;
        self.store.set_string(&self.key, &json).await?;
        debug!(key = %self.key, count = steps.len(), "Stored step list");
        Ok(())
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::Library(event)).ok();
        }
    }
}

#[async_trait]
impl StepRepository for SettingsStepRepository {
    async fn get_ordered_steps(&self) -> Result<Vec<StepRecord>> {
        self.load().await
    }

    async fn set_ordered_steps(&self, steps: &[StepRecord]) -> Result<()> {
        let mut seen = HashSet::new();
        for step in steps {
            step.validate().map_err(|message| LibraryError::InvalidInput {
                field: "steps".to_string(),
                message,
            })?;
            if !seen.insert(step.step_number) {
                return Err(LibraryError::InvalidInput {
                    field: "step_number".to_string(),
                    message: format!("step number {} is used twice", step.step_number),
                });
            }
        }

        let mut ordered = steps.to_vec();
        ordered.sort_by_key(|step| step.step_number);

        let _guard = self.write_lock.lock().await;
        self.store(&ordered).await
    }

    async fn append_step(&self, uri: &str, filename: &str) -> Result<StepRecord> {
        let _guard = self.write_lock.lock().await;

        let mut steps = self.load().await?;
        let next = steps.last().map_or(1, |last| last.step_number + 1);
        let step = StepRecord::new(next, uri, filename);
        step.validate().map_err(|message| LibraryError::InvalidInput {
            field: "uri".to_string(),
            message,
        })?;

        steps.push(step.clone());
        self.store(&steps).await?;

        info!(step_id = %step.id, step_number = step.step_number, "Step added");
        self.emit(LibraryEvent::StepAdded {
            step_id: step.id.clone(),
            step_number: step.step_number,
            filename: step.filename.clone(),
        });
        Ok(step)
    }

    async fn reset(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let removed = match self.load().await {
            Ok(steps) => steps.len(),
            Err(LibraryError::Corrupt(message)) => {
                warn!(key = %self.key, %message, "Discarding corrupt step list");
                0
            }
            Err(err) => return Err(err),
        };
        self.store.delete(&self.key).await?;

        info!(removed, "Steps reset");
        self.emit(LibraryEvent::StepsReset { removed });
        Ok(removed)
    }
}
