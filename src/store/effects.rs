use std::sync::Arc;

use log::{debug, error, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::models::PlantReminder;
use crate::notifications::NotificationScheduler;
use crate::persistence::PlantStorage;
use crate::settings::ReminderTime;

use super::events::{Listeners, StoreEvent};

/// Side effect of a mutation, applied after the in-memory change.
pub(crate) enum Effect {
    Persist(Vec<PlantReminder>),
    Schedule {
        plant: PlantReminder,
        time: ReminderTime,
    },
    Cancel(PlantReminder),
    CancelAll,
    ResetBadge,
    /// Answered once every effect queued before it has been applied.
    Barrier(oneshot::Sender<()>),
}

/// Drain `Effect`s strictly in the order they were queued.
pub(crate) fn spawn_effect_worker(
    storage: Arc<dyn PlantStorage>,
    scheduler: Arc<NotificationScheduler>,
    listeners: Arc<Listeners>,
) -> (mpsc::UnboundedSender<Effect>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Effect>();

    let handle = tokio::spawn(async move {
        while let Some(effect) = rx.recv().await {
            match effect {
                Effect::Persist(plants) => {
                    if let Err(err) = storage.save(&plants).await {
                        error!("Failed to save {} plants: {err}", plants.len());
                        listeners.emit(StoreEvent::SaveFailed {
                            message: err.to_string(),
                        });
                    }
                }
                Effect::Schedule { plant, time } => {
                    // Failures are logged by the scheduler.
                    let _ = scheduler
                        .schedule_for_plant(&plant, time.hour, time.minute)
                        .await;
                }
                Effect::Cancel(plant) => {
                    let _ = scheduler.cancel_for_plant(&plant).await;
                }
                Effect::CancelAll => {
                    let _ = scheduler.cancel_all().await;
                }
                Effect::ResetBadge => {
                    let _ = scheduler.reset_badge_signal().await;
                }
                Effect::Barrier(reply) => {
                    if reply.send(()).is_err() {
                        warn!("Flush caller went away before the barrier was reached");
                    }
                }
            }
        }

        debug!("Reminder effect worker stopped");
    });

    (tx, handle)
}
