use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROOMS: [&str; 5] = ["Living Room", "Bedroom", "Kitchen", "Bathroom", "Balcony"];
pub const LIGHT_CONDITIONS: [&str; 3] = ["Full sun", "Partial sun", "Low light"];
pub const WATER_AMOUNTS: [&str; 5] = ["10-20 ml", "20-50 ml", "50-100 ml", "100-200 ml", "200+ ml"];

pub const DEFAULT_ROOM: &str = "Bedroom";
pub const DEFAULT_LIGHT_CONDITION: &str = "Full sun";
pub const DEFAULT_WATER_AMOUNT: &str = "20-50 ml";

/// A single plant and its watering state, as persisted in the `SavedPlants` slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlantReminder {
    pub id: Uuid,
    pub plant_name: String,
    pub room: String,
    pub light_condition: String,
    pub water_amount: String,
    /// Watered since the last reset.
    pub is_checked: bool,
}

impl PlantReminder {
    pub fn from_draft(draft: PlantDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            plant_name: draft.plant_name,
            room: draft.room,
            light_condition: draft.light_condition,
            water_amount: draft.water_amount,
            is_checked: false,
        }
    }
}

/// Creation input for a plant. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlantDraft {
    pub plant_name: String,
    pub room: String,
    pub light_condition: String,
    pub water_amount: String,
}

impl PlantDraft {
    pub fn new(plant_name: impl Into<String>) -> Self {
        Self {
            plant_name: plant_name.into(),
            ..Self::default()
        }
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    pub fn light_condition(mut self, light: impl Into<String>) -> Self {
        self.light_condition = light.into();
        self
    }

    pub fn water_amount(mut self, amount: impl Into<String>) -> Self {
        self.water_amount = amount.into();
        self
    }
}

impl Default for PlantDraft {
    fn default() -> Self {
        Self {
            plant_name: String::new(),
            room: DEFAULT_ROOM.into(),
            light_condition: DEFAULT_LIGHT_CONDITION.into(),
            water_amount: DEFAULT_WATER_AMOUNT.into(),
        }
    }
}
