use async_trait::async_trait;
use log::debug;

use crate::db::Database;
use crate::error::StorageError;
use crate::models::PlantReminder;

use super::{decode_plants, encode_plants, PlantStorage, SAVED_PLANTS_SLOT};

/// Stores the collection as a row of the `kv_slots` table.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
    slot: String,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self::with_slot(db, SAVED_PLANTS_SLOT)
    }

    pub fn with_slot(db: Database, slot: impl Into<String>) -> Self {
        Self {
            db,
            slot: slot.into(),
        }
    }
}

#[async_trait]
impl PlantStorage for SqliteStorage {
    async fn save(&self, plants: &[PlantReminder]) -> Result<(), StorageError> {
        let encoded = encode_plants(plants)?;
        self.db.write_slot(&self.slot, encoded).await?;
        debug!("Saved {} plants to slot {}", plants.len(), self.slot);
        Ok(())
    }

    async fn load(&self) -> Result<Vec<PlantReminder>, StorageError> {
        match self.db.read_slot(&self.slot).await? {
            Some(raw) => decode_plants(&raw),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sample_plants;

    fn storage() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("planto.sqlite3")).unwrap();
        (SqliteStorage::new(db), dir)
    }

    #[tokio::test]
    async fn round_trips_collection() {
        let (storage, _dir) = storage();
        let plants = sample_plants();

        storage.save(&plants).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), plants);
    }

    #[tokio::test]
    async fn absent_slot_is_empty() {
        let (storage, _dir) = storage();
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_slot_is_decode_error() {
        let (storage, _dir) = storage();
        storage
            .db
            .write_slot(SAVED_PLANTS_SLOT, "[{\"plantName\":".into())
            .await
            .unwrap();

        assert!(matches!(storage.load().await, Err(StorageError::Decode(_))));
    }

    #[tokio::test]
    async fn save_replaces_previous_collection() {
        let (storage, _dir) = storage();
        let plants = sample_plants();
        storage.save(&plants).await.unwrap();
        storage.save(&plants[..1]).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), plants[..1].to_vec());
    }
}
