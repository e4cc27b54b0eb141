//! Persistent settings for the sync service.
//!
//! This module provides settings management with XDG Base Directory
//! compliance.

pub mod settings;

pub use settings::{SettingsError, SettingsManager, SyncSettings, get_config_path};
