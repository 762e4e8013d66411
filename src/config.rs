use std::{env, path::PathBuf};

use directories::ProjectDirs;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    JsonFile,
}

/// Process configuration, read from `PLANTO_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    /// Verbose logs and a short repeating reminder cadence.
    pub debug: bool,
    /// Answer the simulated permission prompt with "allow".
    pub notifications_allowed: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("PLANTO_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let storage = match lookup("PLANTO_STORAGE").as_deref().map(str::trim) {
            None | Some("") => StorageBackend::Sqlite,
            Some(value) if value.eq_ignore_ascii_case("sqlite") => StorageBackend::Sqlite,
            Some(value) if value.eq_ignore_ascii_case("json") => StorageBackend::JsonFile,
            Some(other) => {
                warn!("Unknown PLANTO_STORAGE value '{other}', using sqlite");
                StorageBackend::Sqlite
            }
        };

        let debug = lookup("PLANTO_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let notifications_allowed = lookup("PLANTO_NOTIFICATIONS")
            .map(|value| {
                let value = value.trim();
                !(value == "0"
                    || value.eq_ignore_ascii_case("false")
                    || value.eq_ignore_ascii_case("denied"))
            })
            .unwrap_or(true);

        Self {
            data_dir,
            storage,
            debug,
            notifications_allowed,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("planto.sqlite3")
    }

    pub fn plants_file_path(&self) -> PathBuf {
        self.data_dir.join("plants.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "planto", "Planto")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".planto"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]);
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert!(!config.debug);
        assert!(config.notifications_allowed);
        assert!(config.database_path().ends_with("planto.sqlite3"));
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PLANTO_DATA_DIR", "/tmp/planto-test"),
            ("PLANTO_STORAGE", "JSON"),
            ("PLANTO_DEBUG", "true"),
            ("PLANTO_NOTIFICATIONS", "denied"),
        ]);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/planto-test"));
        assert_eq!(config.storage, StorageBackend::JsonFile);
        assert!(config.debug);
        assert!(!config.notifications_allowed);
        assert_eq!(
            config.plants_file_path(),
            PathBuf::from("/tmp/planto-test/plants.json")
        );
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/tmp/planto-test/settings.json")
        );
    }

    #[test]
    fn unknown_backend_falls_back_to_sqlite() {
        assert_eq!(config(&[("PLANTO_STORAGE", "mongo")]).storage, StorageBackend::Sqlite);
    }
}
