use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};

use crate::error::SchedulingError;
use crate::models::PlantReminder;

use super::{
    trigger_identifier, NotificationCenter, NotificationContent, NotificationRequest,
    TriggerSchedule,
};

/// How plant triggers repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderCadence {
    /// Once a day at the requested time of day.
    Daily,
    /// Every fixed interval, ignoring the time of day. Used in debug mode.
    Every(Duration),
}

/// Keeps at most one pending trigger per plant on a [`NotificationCenter`].
///
/// Every operation logs its own failure before returning it; callers are
/// free to ignore the result.
pub struct NotificationScheduler {
    center: Arc<dyn NotificationCenter>,
    cadence: ReminderCadence,
}

impl NotificationScheduler {
    pub fn new(center: Arc<dyn NotificationCenter>) -> Self {
        Self::with_cadence(center, ReminderCadence::Daily)
    }

    pub fn with_cadence(center: Arc<dyn NotificationCenter>, cadence: ReminderCadence) -> Self {
        Self { center, cadence }
    }

    pub fn cadence(&self) -> ReminderCadence {
        self.cadence
    }

    pub async fn request_permission(&self) -> Result<bool, SchedulingError> {
        match self.center.request_authorization().await {
            Ok(true) => {
                info!("Notification permission granted");
                Ok(true)
            }
            Ok(false) => {
                warn!("Notification permission denied; reminders will not be shown");
                Ok(false)
            }
            Err(err) => {
                warn!("Notification permission error: {err}");
                Err(err)
            }
        }
    }

    /// Create or overwrite the recurring trigger for `plant`.
    pub async fn schedule_for_plant(
        &self,
        plant: &PlantReminder,
        hour: u32,
        minute: u32,
    ) -> Result<(), SchedulingError> {
        if hour >= 24 || minute >= 60 {
            let err = SchedulingError::InvalidTime { hour, minute };
            warn!("Not scheduling reminder for {}: {err}", plant.plant_name);
            return Err(err);
        }

        let schedule = match self.cadence {
            ReminderCadence::Daily => TriggerSchedule::Daily { hour, minute },
            ReminderCadence::Every(every) => TriggerSchedule::Interval { every },
        };

        let request = NotificationRequest {
            identifier: trigger_identifier(plant.id),
            content: NotificationContent::watering(&plant.plant_name),
            schedule,
        };

        match self.center.add(request).await {
            Ok(()) => {
                info!(
                    "Reminder scheduled for {} at {hour:02}:{minute:02}",
                    plant.plant_name
                );
                Ok(())
            }
            Err(err) => {
                warn!("Error scheduling reminder for {}: {err}", plant.plant_name);
                Err(err)
            }
        }
    }

    pub async fn cancel_for_plant(&self, plant: &PlantReminder) -> Result<(), SchedulingError> {
        let identifier = trigger_identifier(plant.id);
        self.center
            .remove_pending(&[identifier])
            .await
            .map(|()| debug!("Cancelled reminder for {}", plant.plant_name))
            .map_err(|err| {
                warn!("Error cancelling reminder for {}: {err}", plant.plant_name);
                err
            })
    }

    /// Drop every pending trigger, whichever plant owns it.
    pub async fn cancel_all(&self) -> Result<(), SchedulingError> {
        self.center
            .remove_all_pending()
            .await
            .map(|()| debug!("All reminders cancelled"))
            .map_err(|err| {
                warn!("Error cancelling all reminders: {err}");
                err
            })
    }

    pub async fn reset_badge_signal(&self) -> Result<(), SchedulingError> {
        self.center.set_badge_count(0).await.map_err(|err| {
            warn!("Error resetting badge count: {err}");
            err
        })
    }

    pub async fn pending_trigger_ids(&self) -> Result<Vec<String>, SchedulingError> {
        let requests = self.center.pending_requests().await?;
        Ok(requests.into_iter().map(|r| r.identifier).collect())
    }
}
