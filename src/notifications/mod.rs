//! Local watering reminders.
//!
//! [`NotificationScheduler`] maps each plant to at most one pending trigger
//! on a [`NotificationCenter`]. [`LocalNotificationCenter`] is the in-process
//! center used by the app; tests substitute their own.

use std::time::Duration;

use uuid::Uuid;

mod center;
mod local;
mod scheduler;

pub use center::NotificationCenter;
pub use local::{next_daily_fire, DeliveredNotification, LocalNotificationCenter};
pub use scheduler::{NotificationScheduler, ReminderCadence};

pub const NOTIFICATION_TITLE: &str = "Planto";
pub const TESTING_INTERVAL: Duration = Duration::from_secs(600);

/// Identifier of the trigger owned by the plant with `plant_id`.
pub fn trigger_identifier(plant_id: Uuid) -> String {
    format!("plant_{plant_id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub badge: u32,
}

impl NotificationContent {
    pub fn watering(plant_name: &str) -> Self {
        Self {
            title: NOTIFICATION_TITLE.into(),
            body: format!("Time to water {plant_name} 💧"),
            badge: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSchedule {
    /// Fires every day at `hour:minute` local time.
    Daily { hour: u32, minute: u32 },
    /// Fires every `every`, starting one interval from now.
    Interval { every: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub schedule: TriggerSchedule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_identifier_depends_only_on_plant_id() {
        let id = Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        assert_eq!(
            trigger_identifier(id),
            "plant_0f8fad5b-d9cb-469f-a165-70867728950e"
        );
        assert_eq!(trigger_identifier(id), trigger_identifier(id));
        assert_ne!(trigger_identifier(id), trigger_identifier(Uuid::new_v4()));
    }

    #[test]
    fn watering_content_embeds_plant_name() {
        let content = NotificationContent::watering("Pothos");
        assert_eq!(content.title, "Planto");
        assert_eq!(content.body, "Time to water Pothos 💧");
        assert_eq!(content.badge, 1);
    }
}
