//! # Sync Configuration
//!
//! Configuration for the coordinator and the local record.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DOKAN_DEBOUNCE_SECS=5                                              │
//! │     DOKAN_STORAGE_KEY=dokan_v1_data                                    │
//! │     DOKAN_DB_PATH=/var/lib/dokan/dokan.db                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/dokan/sync.toml (Linux)                                  │
//! │     ~/Library/Application Support/com.dokan.dokan/sync.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     10 s debounce, key "dokan_v1_data", db in the data dir             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [sync]
//! debounce_secs = 10
//!
//! [storage]
//! key = "dokan_v1_data"
//! db_path = "/var/lib/dokan/dokan.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

/// Longest accepted quiet window.
const MAX_DEBOUNCE_SECS: u64 = 3600;

// =============================================================================
// Sync Settings
// =============================================================================

/// Push behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Quiet period after the last mutation before a push (seconds).
    #[serde(default = "default_debounce")]
    pub debounce_secs: u64,
}

fn default_debounce() -> u64 {
    10
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            debounce_secs: default_debounce(),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the local record lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Key of the record in the `snapshots` table.
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// SQLite file. `None` means `<data dir>/dokan.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_storage_key() -> String {
    dokan_core::STORAGE_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            key: default_storage_key(),
            db_path: None,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl SyncConfig {
    /// Loads configuration: defaults, then the TOML file (if present), then
    /// environment overrides, then validation.
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.sync.debounce_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "debounce_secs must be greater than 0".into(),
            ));
        }

        if self.sync.debounce_secs > MAX_DEBOUNCE_SECS {
            return Err(SyncError::InvalidConfig(format!(
                "debounce_secs must be at most {}, got {}",
                MAX_DEBOUNCE_SECS, self.sync.debounce_secs
            )));
        }

        if self.storage.key.trim().is_empty() {
            return Err(SyncError::InvalidConfig("storage key must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secs) = std::env::var("DOKAN_DEBOUNCE_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => {
                    debug!(debounce_secs = s, "Overriding debounce from environment");
                    self.sync.debounce_secs = s;
                }
                Err(_) => warn!(value = %secs, "Ignoring unparsable DOKAN_DEBOUNCE_SECS"),
            }
        }

        if let Ok(key) = std::env::var("DOKAN_STORAGE_KEY") {
            debug!(key = %key, "Overriding storage key from environment");
            self.storage.key = key;
        }

        if let Ok(path) = std::env::var("DOKAN_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.db_path = Some(PathBuf::from(path));
        }
    }

    /// `<config dir>/sync.toml` for this platform.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "dokan", "dokan")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The debounce window as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.sync.debounce_secs)
    }

    /// Resolved database path: the configured one, else `<data dir>/dokan.db`.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.storage.db_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "dokan", "dokan")
                .map(|dirs| dirs.data_dir().join("dokan.db"))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
