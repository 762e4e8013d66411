//! The reminder store: single writer of the plant collection.
//!
//! Every mutation runs inside one critical section that changes the
//! collection, queues its side effects (persist, then reconcile the
//! scheduler) onto a FIFO worker and queues the resulting snapshot for
//! listeners. Callers never wait for storage or the
//! notification platform, and effects for a later call can never overtake
//! those of an earlier one.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::error::{ReminderError, StorageError};
use crate::models::{PlantDraft, PlantReminder};
use crate::notifications::NotificationScheduler;
use crate::persistence::PlantStorage;
use crate::settings::ReminderTime;

mod effects;
mod events;
mod state;

use effects::{spawn_effect_worker, Effect};
use events::Listeners;

pub use events::{Listener, ListenerId, StoreEvent};
pub use state::{
    all_completed, checked_count, progress_message, progress_percentage, PlantSnapshot,
};

struct StoreState {
    plants: Vec<PlantReminder>,
    reminder_time: ReminderTime,
    /// Bumped by every change to `plants`.
    generation: u64,
}

struct StoreInner {
    state: Mutex<StoreState>,
    storage: Arc<dyn PlantStorage>,
    listeners: Arc<Listeners>,
    effects: mpsc::UnboundedSender<Effect>,
    _worker: JoinHandle<()>,
}

#[derive(Clone)]
pub struct ReminderStore {
    inner: Arc<StoreInner>,
}

impl ReminderStore {
    /// Build an empty store. Must be called from inside a Tokio runtime: the
    /// side-effect worker is spawned here.
    pub fn new(
        storage: Arc<dyn PlantStorage>,
        scheduler: Arc<NotificationScheduler>,
        reminder_time: ReminderTime,
    ) -> Self {
        let listeners = Arc::new(Listeners::default());
        let (effects, worker) =
            spawn_effect_worker(storage.clone(), scheduler, listeners.clone());

        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState {
                    plants: Vec::new(),
                    reminder_time,
                    generation: 0,
                }),
                storage,
                listeners,
                effects,
                _worker: worker,
            }),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.add(Arc::new(listener))
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    pub fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot::from_plants(&self.lock_state().plants)
    }

    pub fn plants(&self) -> Vec<PlantReminder> {
        self.lock_state().plants.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<PlantReminder> {
        self.lock_state().plants.iter().find(|p| p.id == id).cloned()
    }

    pub fn reminder_time(&self) -> ReminderTime {
        self.lock_state().reminder_time
    }

    /// Replace the collection with what storage holds and re-arm a trigger
    /// for every plant. Any failure leaves the store empty with no triggers;
    /// the error is returned for diagnostics only.
    ///
    /// A mutation that lands while the slot is being read makes the read
    /// stale, so the read is repeated until no mutation overlapped it.
    pub async fn load(&self) -> Result<usize, StorageError> {
        let result = loop {
            let generation = self.lock_state().generation;
            // Saves queued so far must land before we read the slot back.
            self.flush().await;
            let loaded = self.inner.storage.load().await;

            let mut state = self.lock_state();
            if state.generation != generation {
                drop(state);
                debug!("Plants changed while loading, reading the slot again");
                continue;
            }

            self.enqueue(Effect::CancelAll);
            let result = match loaded {
                Ok(plants) => {
                    state.plants = dedupe_ids(plants);
                    for plant in &state.plants {
                        self.enqueue(Effect::Schedule {
                            plant: plant.clone(),
                            time: state.reminder_time,
                        });
                    }
                    Ok(state.plants.len())
                }
                Err(err) => {
                    state.plants.clear();
                    Err(err)
                }
            };
            self.commit(&mut state);
            break result;
        };

        match &result {
            Ok(count) => info!("Loaded {count} plants"),
            Err(StorageError::Decode(err)) => {
                error!("Saved plants are unreadable, starting empty: {err}")
            }
            Err(err) => error!("Failed to load plants, starting empty: {err}"),
        }

        self.inner.listeners.deliver_queued();
        result
    }

    pub fn add_plant(&self, draft: PlantDraft) -> Result<PlantReminder, ReminderError> {
        let plant_name = validated_name(&draft.plant_name)?;
        let mut plant = PlantReminder::from_draft(PlantDraft {
            plant_name,
            ..draft
        });

        {
            let mut state = self.lock_state();
            while state.plants.iter().any(|p| p.id == plant.id) {
                plant.id = Uuid::new_v4();
            }
            state.plants.push(plant.clone());

            self.enqueue(Effect::Persist(state.plants.clone()));
            self.enqueue(Effect::Schedule {
                plant: plant.clone(),
                time: state.reminder_time,
            });
            self.commit(&mut state);
        }

        info!("Added plant {} ({})", plant.plant_name, plant.id);
        self.inner.listeners.deliver_queued();
        Ok(plant)
    }

    /// Replace the plant with the same id in place.
    pub fn update_plant(&self, mut updated: PlantReminder) -> Result<PlantReminder, ReminderError> {
        updated.plant_name = validated_name(&updated.plant_name)?;

        {
            let mut state = self.lock_state();
            let index = state
                .plants
                .iter()
                .position(|p| p.id == updated.id)
                .ok_or(ReminderError::NotFound(updated.id))?;
            state.plants[index] = updated.clone();

            self.enqueue(Effect::Persist(state.plants.clone()));
            self.enqueue(Effect::Cancel(updated.clone()));
            self.enqueue(Effect::Schedule {
                plant: updated.clone(),
                time: state.reminder_time,
            });
            self.commit(&mut state);
        }

        info!("Updated plant {} ({})", updated.plant_name, updated.id);
        self.inner.listeners.deliver_queued();
        Ok(updated)
    }

    /// Remove the plant if present. Deleting an unknown id does nothing.
    pub fn delete_plant(&self, id: Uuid) -> Option<PlantReminder> {
        let removed = {
            let mut state = self.lock_state();
            let index = state.plants.iter().position(|p| p.id == id)?;
            let removed = state.plants.remove(index);

            self.enqueue(Effect::Persist(state.plants.clone()));
            self.enqueue(Effect::Cancel(removed.clone()));
            self.commit(&mut state);
            removed
        };

        info!("Deleted plant {} ({})", removed.plant_name, removed.id);
        self.inner.listeners.deliver_queued();
        Some(removed)
    }

    /// Flip the watered flag. Returns the new value.
    pub fn toggle_checked(&self, id: Uuid) -> Result<bool, ReminderError> {
        let checked = {
            let mut state = self.lock_state();
            let plant = state
                .plants
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ReminderError::NotFound(id))?;
            plant.is_checked = !plant.is_checked;
            let checked = plant.is_checked;

            self.enqueue(Effect::Persist(state.plants.clone()));
            if checked {
                self.enqueue(Effect::ResetBadge);
            }
            self.commit(&mut state);
            checked
        };

        self.inner.listeners.deliver_queued();
        Ok(checked)
    }

    pub fn reset_all_checks(&self) {
        {
            let mut state = self.lock_state();
            for plant in state.plants.iter_mut() {
                plant.is_checked = false;
            }
            self.enqueue(Effect::Persist(state.plants.clone()));
            self.commit(&mut state);
        }

        self.inner.listeners.deliver_queued();
    }

    /// Move every reminder to a new time of day.
    pub fn set_reminder_time(&self, time: ReminderTime) {
        let mut state = self.lock_state();
        state.reminder_time = time;
        for plant in &state.plants {
            self.enqueue(Effect::Schedule {
                plant: plant.clone(),
                time,
            });
        }
        info!(
            "Reminder time set to {:02}:{:02} for {} plants",
            time.hour,
            time.minute,
            state.plants.len()
        );
    }

    /// Wait until every side effect queued so far has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Effect::Barrier(tx));
        let _ = rx.await;
    }

    fn enqueue(&self, effect: Effect) {
        if self.inner.effects.send(effect).is_err() {
            warn!("Effect worker is gone; dropping side effect");
        }
    }

    /// Record a change to the collection. Runs under the state lock so the
    /// snapshot is queued in the same order as the changes themselves.
    fn commit(&self, state: &mut StoreState) {
        state.generation += 1;
        self.queue_snapshot(state);
    }

    fn queue_snapshot(&self, state: &StoreState) {
        self.inner
            .listeners
            .queue(StoreEvent::Changed(PlantSnapshot::from_plants(&state.plants)));
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn validated_name(raw: &str) -> Result<String, ReminderError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ReminderError::Validation("plant name is required".into()));
    }
    Ok(name.to_string())
}

/// Keep the first plant for each id.
fn dedupe_ids(plants: Vec<PlantReminder>) -> Vec<PlantReminder> {
    let mut seen = std::collections::HashSet::new();
    let total = plants.len();
    let unique: Vec<_> = plants.into_iter().filter(|p| seen.insert(p.id)).collect();
    if unique.len() != total {
        warn!("Dropped {} plants with duplicate ids", total - unique.len());
    }
    unique
}
