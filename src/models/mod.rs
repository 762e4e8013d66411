mod plant;

pub use plant::{
    PlantDraft, PlantReminder, DEFAULT_LIGHT_CONDITION, DEFAULT_ROOM, DEFAULT_WATER_AMOUNT,
    LIGHT_CONDITIONS, ROOMS, WATER_AMOUNTS,
};
