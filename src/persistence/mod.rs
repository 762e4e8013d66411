//! Persistence adapter for the plant collection.
//!
//! The whole ordered collection is stored as one JSON document in a single
//! named slot. Saving always replaces the full document.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::PlantReminder;

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub const SAVED_PLANTS_SLOT: &str = "SavedPlants";

#[async_trait]
pub trait PlantStorage: Send + Sync {
    /// Replace the stored collection with `plants`.
    async fn save(&self, plants: &[PlantReminder]) -> Result<(), StorageError>;

    /// Read the stored collection. An absent slot is an empty collection.
    async fn load(&self) -> Result<Vec<PlantReminder>, StorageError>;
}

pub fn encode_plants(plants: &[PlantReminder]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(plants)?)
}

pub fn decode_plants(raw: &str) -> Result<Vec<PlantReminder>, StorageError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
pub(crate) fn sample_plants() -> Vec<PlantReminder> {
    use crate::models::PlantDraft;

    let mut pothos = PlantReminder::from_draft(PlantDraft::new("Pothos"));
    pothos.is_checked = true;
    let monstera = PlantReminder::from_draft(
        PlantDraft::new("Monstera")
            .room("Living Room")
            .light_condition("Partial sun")
            .water_amount("100-200 ml"),
    );
    let cactus = PlantReminder::from_draft(
        PlantDraft::new("Cactus")
            .room("Balcony")
            .water_amount("10-20 ml"),
    );
    vec![pothos, monstera, cactus]
}
