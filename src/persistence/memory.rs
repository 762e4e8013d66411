use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::PlantReminder;

use super::{decode_plants, encode_plants, PlantStorage};

/// In-process slot. Holds the encoded document so decode behaves exactly as
/// it does for durable backends.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with a raw document, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl PlantStorage for MemoryStorage {
    async fn save(&self, plants: &[PlantReminder]) -> Result<(), StorageError> {
        let encoded = encode_plants(plants)?;
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(encoded);
        Ok(())
    }

    async fn load(&self) -> Result<Vec<PlantReminder>, StorageError> {
        match self.raw() {
            Some(raw) => decode_plants(&raw),
            None => Ok(Vec::new()),
        }
    }
}
