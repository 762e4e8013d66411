pub mod config;
mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod settings;
pub mod store;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;

pub use config::{AppConfig, StorageBackend};
pub use db::Database;
pub use error::{ReminderError, SchedulingError, StorageError};
pub use models::{PlantDraft, PlantReminder};
pub use notifications::{LocalNotificationCenter, NotificationScheduler, ReminderCadence};
pub use persistence::{JsonFileStorage, MemoryStorage, PlantStorage, SqliteStorage};
pub use settings::{ReminderTime, SettingsStore};
pub use store::{PlantSnapshot, ReminderStore, StoreEvent};
pub use utils::logging::init_logging;

/// Everything the presentation layer talks to, wired together.
pub struct PlantoApp {
    pub store: ReminderStore,
    pub scheduler: Arc<NotificationScheduler>,
    pub center: Arc<LocalNotificationCenter>,
    pub settings: SettingsStore,
    config: AppConfig,
}

impl PlantoApp {
    /// Open storage and settings under `config.data_dir`, load the saved
    /// plants and ask for notification permission in the background.
    pub async fn start(config: AppConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let storage: Arc<dyn PlantStorage> = match config.storage {
            StorageBackend::Sqlite => {
                let database = Database::new(config.database_path())?;
                info!("Plants stored in {}", database.path().display());
                Arc::new(SqliteStorage::new(database))
            }
            StorageBackend::JsonFile => {
                let storage = JsonFileStorage::new(config.plants_file_path());
                info!("Plants stored in {}", storage.path().display());
                Arc::new(storage)
            }
        };

        let settings = SettingsStore::new(config.settings_path())?;
        info!("Settings loaded from {}", settings.path().display());

        let center = Arc::new(LocalNotificationCenter::with_permission(
            config.notifications_allowed,
        ));
        let cadence = if config.debug {
            ReminderCadence::Every(notifications::TESTING_INTERVAL)
        } else {
            ReminderCadence::Daily
        };
        let scheduler = Arc::new(NotificationScheduler::with_cadence(center.clone(), cadence));
        let prompt = scheduler.clone();
        tokio::spawn(async move {
            if let Err(err) = prompt.request_permission().await {
                warn!("Continuing without notification permission: {err}");
            }
        });

        let store = ReminderStore::new(storage, scheduler.clone(), settings.reminder_time());
        if let Err(err) = store.load().await {
            warn!("Starting with an empty plant list: {err}");
        }

        Ok(Self {
            store,
            scheduler,
            center,
            settings,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Persist a new reminder time and move every trigger to it.
    pub fn set_reminder_time(&self, hour: u32, minute: u32) -> anyhow::Result<()> {
        let time = ReminderTime::new(hour, minute)?;
        self.settings.update_reminder_time(time)?;
        self.store.set_reminder_time(time);
        Ok(())
    }
}

/// Headless reminder daemon: load plants, keep their triggers armed, and log
/// deliveries until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_logging(config.debug);

    info!("Planto starting up...");

    let app = PlantoApp::start(config).await?;
    app.store.subscribe(|event| match event {
        StoreEvent::Changed(snapshot) => info!("{}", snapshot.progress_message),
        StoreEvent::SaveFailed { message } => warn!("Changes were not saved: {message}"),
    });

    let snapshot = app.store.snapshot();
    info!(
        "{} plants, {} watered: {}",
        snapshot.plants.len(),
        snapshot.checked_count,
        snapshot.progress_message
    );
    if app.scheduler.cadence() != ReminderCadence::Daily {
        info!("Debug mode: reminders repeat every 10 minutes");
    }

    let mut deliveries = app.center.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            delivered = deliveries.recv() => match delivered {
                Ok(notification) => info!(
                    "🔔 {}: {} (badge {})",
                    notification.content.title,
                    notification.content.body,
                    notification.badge_count
                ),
                Err(RecvError::Lagged(missed)) => warn!("Missed {missed} notifications"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    app.store.flush().await;
    info!("Planto shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{trigger_identifier, NotificationCenter};

    fn config(dir: &tempfile::TempDir, storage: StorageBackend) -> AppConfig {
        AppConfig {
            data_dir: dir.path().join("data"),
            storage,
            debug: false,
            notifications_allowed: true,
        }
    }

    async fn restart_keeps_plants(storage: StorageBackend) {
        let dir = tempfile::tempdir().unwrap();

        let plant = {
            let app = PlantoApp::start(config(&dir, storage)).await.unwrap();
            assert!(app.store.plants().is_empty());
            let plant = app
                .store
                .add_plant(PlantDraft::new("Pothos").room("Bedroom"))
                .unwrap();
            app.store.toggle_checked(plant.id).unwrap();
            app.store.flush().await;
            app.store.get(plant.id).unwrap()
        };

        let app = PlantoApp::start(config(&dir, storage)).await.unwrap();
        assert_eq!(app.store.plants(), vec![plant.clone()]);
        assert!(app.store.snapshot().all_completed);

        app.store.flush().await;
        assert_eq!(
            app.scheduler.pending_trigger_ids().await.unwrap(),
            vec![trigger_identifier(plant.id)]
        );
    }

    #[tokio::test]
    async fn sqlite_backend_survives_restart() {
        restart_keeps_plants(StorageBackend::Sqlite).await;
    }

    #[tokio::test]
    async fn json_backend_survives_restart() {
        restart_keeps_plants(StorageBackend::JsonFile).await;
    }

    #[tokio::test]
    async fn reminder_time_is_saved_and_applied() {
        let dir = tempfile::tempdir().unwrap();
        {
            let app = PlantoApp::start(config(&dir, StorageBackend::JsonFile))
                .await
                .unwrap();
            app.store.add_plant(PlantDraft::new("Fern")).unwrap();
            app.set_reminder_time(7, 15).unwrap();
            assert!(app.set_reminder_time(7, 75).is_err());
            app.store.flush().await;

            let pending = app.center.pending_requests().await.unwrap();
            assert_eq!(
                pending[0].schedule,
                notifications::TriggerSchedule::Daily { hour: 7, minute: 15 }
            );
        }

        let app = PlantoApp::start(config(&dir, StorageBackend::JsonFile))
            .await
            .unwrap();
        assert_eq!(app.store.reminder_time(), ReminderTime { hour: 7, minute: 15 });
        assert_eq!(app.config().storage, StorageBackend::JsonFile);
    }

    async fn wait_for_authorization(center: &LocalNotificationCenter) -> bool {
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while !center.is_authorized() {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }

    #[tokio::test]
    async fn permission_is_requested_without_blocking_start() {
        let dir = tempfile::tempdir().unwrap();
        let app = PlantoApp::start(config(&dir, StorageBackend::JsonFile))
            .await
            .unwrap();
        assert!(wait_for_authorization(&app.center).await);
    }

    #[tokio::test]
    async fn denied_permission_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir, StorageBackend::JsonFile);
        config.notifications_allowed = false;

        let app = PlantoApp::start(config).await.unwrap();
        assert!(!wait_for_authorization(&app.center).await);
        let plant = app.store.add_plant(PlantDraft::new("Fern")).unwrap();
        app.store.flush().await;
        assert_eq!(
            app.scheduler.pending_trigger_ids().await.unwrap(),
            vec![trigger_identifier(plant.id)]
        );
    }
}
