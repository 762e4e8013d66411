use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::fs;

use crate::error::StorageError;
use crate::models::PlantReminder;

use super::{decode_plants, encode_plants, PlantStorage};

/// Stores the collection in a single JSON file. Writes land in a sibling
/// temp file first and are renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "plants.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PlantStorage for JsonFileStorage {
    async fn save(&self, plants: &[PlantReminder]) -> Result<(), StorageError> {
        let encoded = encode_plants(plants)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        fs::write(&temp, encoded.as_bytes()).await?;
        fs::rename(&temp, &self.path).await?;
        debug!("Saved {} plants to {}", plants.len(), self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<PlantReminder>, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => decode_plants(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sample_plants;

    #[tokio::test]
    async fn round_trips_collection() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("plants.json"));
        let plants = sample_plants();

        storage.save(&plants).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), plants);
        assert!(!storage.temp_path().exists());
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join("plants.json"));
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plants.json");
        std::fs::write(&path, "definitely not json").unwrap();

        let storage = JsonFileStorage::new(path);
        assert!(matches!(storage.load().await, Err(StorageError::Decode(_))));
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("a").join("b").join("plants.json"));

        storage.save(&[]).await.unwrap();
        assert!(storage.path().exists());
        assert!(storage.load().await.unwrap().is_empty());
    }
}
