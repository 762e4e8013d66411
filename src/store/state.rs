use serde::Serialize;

use crate::models::PlantReminder;

/// Read-only view of the collection handed to listeners and the UI.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlantSnapshot {
    pub plants: Vec<PlantReminder>,
    pub checked_count: usize,
    /// In `[0, 1]`; 0 for an empty collection.
    pub progress_percentage: f64,
    pub all_completed: bool,
    pub has_plants: bool,
    pub progress_message: String,
}

impl PlantSnapshot {
    pub fn from_plants(plants: &[PlantReminder]) -> Self {
        let checked = checked_count(plants);
        Self {
            plants: plants.to_vec(),
            checked_count: checked,
            progress_percentage: progress_percentage(plants),
            all_completed: all_completed(plants),
            has_plants: !plants.is_empty(),
            progress_message: progress_message(plants.len(), checked),
        }
    }
}

pub fn checked_count(plants: &[PlantReminder]) -> usize {
    plants.iter().filter(|p| p.is_checked).count()
}

pub fn progress_percentage(plants: &[PlantReminder]) -> f64 {
    if plants.is_empty() {
        return 0.0;
    }
    checked_count(plants) as f64 / plants.len() as f64
}

pub fn all_completed(plants: &[PlantReminder]) -> bool {
    !plants.is_empty() && plants.iter().all(|p| p.is_checked)
}

pub fn progress_message(total: usize, checked: usize) -> String {
    if total == 0 {
        "Add your first plant! 🌱".into()
    } else if checked == 0 {
        "Your plants are waiting for a sip 💧".into()
    } else if checked >= total {
        "All plants feel loved today! ✨".into()
    } else {
        format!("{checked} of your plants feel loved today ✨")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlantDraft;

    fn plants(checks: &[bool]) -> Vec<PlantReminder> {
        checks
            .iter()
            .map(|&checked| {
                let mut plant = PlantReminder::from_draft(PlantDraft::new("Fern"));
                plant.is_checked = checked;
                plant
            })
            .collect()
    }

    #[test]
    fn empty_collection() {
        let snapshot = PlantSnapshot::from_plants(&[]);
        assert_eq!(snapshot.checked_count, 0);
        assert_eq!(snapshot.progress_percentage, 0.0);
        assert!(!snapshot.all_completed);
        assert!(!snapshot.has_plants);
        assert_eq!(snapshot.progress_message, "Add your first plant! 🌱");
    }

    #[test]
    fn nothing_checked() {
        let snapshot = PlantSnapshot::from_plants(&plants(&[false, false]));
        assert_eq!(snapshot.progress_percentage, 0.0);
        assert!(!snapshot.all_completed);
        assert_eq!(snapshot.progress_message, "Your plants are waiting for a sip 💧");
    }

    #[test]
    fn partially_checked() {
        let snapshot = PlantSnapshot::from_plants(&plants(&[true, false, false, true]));
        assert_eq!(snapshot.checked_count, 2);
        assert_eq!(snapshot.progress_percentage, 0.5);
        assert!(!snapshot.all_completed);
        assert_eq!(snapshot.progress_message, "2 of your plants feel loved today ✨");
    }

    #[test]
    fn everything_checked() {
        let snapshot = PlantSnapshot::from_plants(&plants(&[true, true, true]));
        assert_eq!(snapshot.progress_percentage, 1.0);
        assert!(snapshot.all_completed);
        assert_eq!(snapshot.progress_message, "All plants feel loved today! ✨");
    }

    #[test]
    fn percentage_stays_in_unit_range() {
        for total in 1..8 {
            for checked in 0..=total {
                let checks: Vec<bool> = (0..total).map(|i| i < checked).collect();
                let pct = progress_percentage(&plants(&checks));
                assert!((0.0..=1.0).contains(&pct));
                assert_eq!(pct == 1.0, checked == total);
            }
        }
    }
}
