//! Synchronization settings stored under the XDG config directory.
//!
//! Settings live in `$XDG_CONFIG_HOME/tracksync/settings.json` and are
//! created with defaults on first use.

use std::{
    env::var,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::{Path, PathBuf},
};

use {
    parking_lot::{RwLock, RwLockReadGuard},
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Polling periods and startup inputs for the track cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Full library polling period in milliseconds.
    pub all_tracks_interval_ms: u64,
    /// Query result polling period in milliseconds.
    pub query_tracks_interval_ms: u64,
    /// JSON file holding the library to serve, if not given on the command line.
    pub library_file: Option<String>,
    /// Query used when none is given on the command line.
    pub default_query: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            all_tracks_interval_ms: 30_000,
            query_tracks_interval_ms: 5_000,
            library_file: None,
            default_query: String::new(),
        }
    }
}

impl SyncSettings {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` for a zero polling period.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("all_tracks_interval_ms", self.all_tracks_interval_ms),
            ("query_tracks_interval_ms", self.query_tracks_interval_ms),
        ] {
            if value == 0 {
                return Err(SettingsError::InvalidValue {
                    reason: format!("{name} must be greater than zero"),
                });
            }
        }
        Ok(())
    }
}

/// Handles loading, saving, and validation of sync settings.
#[derive(Debug)]
pub struct SettingsManager {
    /// Thread-safe settings storage.
    settings: RwLock<SyncSettings>,
    /// Path to the configuration file on disk.
    config_path: PathBuf,
}

impl SettingsManager {
    /// Creates a settings manager reading the default config path.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if an existing settings file cannot be read,
    /// parsed or validated.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_config_path(get_config_path())
    }

    /// Creates a settings manager with a custom config path.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Path of the settings file
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SettingsManager` or a `SettingsError`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if an existing settings file cannot be read,
    /// parsed or validated, or if a new default file cannot be written.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, SettingsError> {
        if let Some(parent) = config_path.parent() {
            create_dir_all(parent)?;
        }

        let exists = config_path.exists();
        let settings = if exists {
            debug!(path = ?config_path, "Loading settings");
            let settings: SyncSettings = from_str(&read_to_string(&config_path)?)?;
            settings.validate()?;
            settings
        } else {
            debug!(path = ?config_path, "Using default settings");
            SyncSettings::default()
        };

        let manager = Self {
            settings: RwLock::new(settings),
            config_path,
        };
        if !exists {
            manager.save_settings()?;
        }
        Ok(manager)
    }

    /// Gets the current settings.
    pub fn get_settings(&self) -> RwLockReadGuard<'_, SyncSettings> {
        self.settings.read()
    }

    /// Gets the configuration file path.
    #[must_use]
    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Validates, applies and saves new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` without applying anything if
    /// validation fails, or an I/O error if saving fails.
    pub fn update_settings(&self, new_settings: SyncSettings) -> Result<(), SettingsError> {
        new_settings.validate()?;
        *self.settings.write() = new_settings;
        self.save_settings()
    }

    fn save_settings(&self) -> Result<(), SettingsError> {
        debug!(path = ?self.config_path, "Saving settings");
        let contents = to_string_pretty(&*self.settings.read())?;
        write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Path of the settings file under the XDG config home.
#[must_use]
pub fn get_config_path() -> PathBuf {
    let mut config_dir = get_xdg_config_home();
    config_dir.push("tracksync");
    config_dir.push("settings.json");
    config_dir
}

/// Uses `XDG_CONFIG_HOME` when set and non-empty, otherwise `$HOME/.config`.
fn get_xdg_config_home() -> PathBuf {
    if let Ok(config_home) = var("XDG_CONFIG_HOME")
        && !config_home.is_empty()
    {
        return PathBuf::from(config_home);
    }

    if let Ok(home) = var("HOME") {
        return PathBuf::from(home).join(".config");
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use std::fs::{read_to_string, write};

    use {serde_json::from_str, tempfile::tempdir};

    use crate::config::settings::{SettingsError, SettingsManager, SyncSettings};

    #[test]
    fn test_sync_settings_default() {
        let settings = SyncSettings::default();
        assert_eq!(settings.all_tracks_interval_ms, 30_000);
        assert_eq!(settings.query_tracks_interval_ms, 5_000);
        assert_eq!(settings.library_file, None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: SyncSettings = from_str(r#"{ "default_query": "!f{flac}" }"#).unwrap();
        assert_eq!(settings.default_query, "!f{flac}");
        assert_eq!(settings.all_tracks_interval_ms, 30_000);
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let manager = SettingsManager::with_config_path(path.clone()).unwrap();
        assert_eq!(*manager.get_settings(), SyncSettings::default());

        let saved: SyncSettings = from_str(&read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, SyncSettings::default());
    }

    #[test]
    fn test_update_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let manager = SettingsManager::with_config_path(path.clone()).unwrap();

        let updated = SyncSettings {
            query_tracks_interval_ms: 1_000,
            library_file: Some("/music/library.json".to_string()),
            ..SyncSettings::default()
        };
        manager.update_settings(updated.clone()).unwrap();

        let reloaded = SettingsManager::with_config_path(path).unwrap();
        assert_eq!(*reloaded.get_settings(), updated);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let dir = tempdir().unwrap();
        let manager = SettingsManager::with_config_path(dir.path().join("settings.json")).unwrap();

        let invalid = SyncSettings {
            all_tracks_interval_ms: 0,
            ..SyncSettings::default()
        };
        let error = manager.update_settings(invalid).unwrap_err();
        assert!(matches!(error, SettingsError::InvalidValue { .. }));
        assert_eq!(manager.get_settings().all_tracks_interval_ms, 30_000);
    }

    #[test]
    fn test_invalid_file_fails_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write(&path, r#"{ "query_tracks_interval_ms": 0 }"#).unwrap();

        let error = SettingsManager::with_config_path(path).unwrap_err();
        assert!(error.to_string().contains("query_tracks_interval_ms"));
    }
}
