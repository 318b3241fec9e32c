//! # Ledger Configuration
//!
//! Where the store lives and what the shop defaults are.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KIRANA_DB_PATH=/srv/kirana/kirana.db                               │
//! │     KIRANA_STORE_NAME="Sharma General Store"                           │
//! │     KIRANA_GST_PERCENT=5                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kirana-ledger/ledger.toml (Linux)                        │
//! │     ~/Library/Application Support/in.kirana.ledger/ledger.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     kirana.db in the platform data directory, 0% GST                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/kirana/kirana.db"
//! max_connections = 5
//!
//! [store]
//! name = "Sharma General Store"
//! default_gst_percent = 5.0
//! currency_symbol = "₹"
//! ```
//!
//! The shop's business settings (GST actually charged, address, phone) live
//! in the document store's `settings` collection. `default_gst_percent` only
//! seeds that collection on first run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use kirana_db::DbConfig;

// =============================================================================
// Database Section
// =============================================================================

/// `[database]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("in", "kirana", "ledger")
        .map(|dirs| dirs.data_dir().join("kirana.db"))
        .unwrap_or_else(|| PathBuf::from("kirana.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Store Section
// =============================================================================

/// `[store]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Shop name used when the settings collection is still empty.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// GST percentage used when the settings collection is still empty.
    #[serde(default)]
    pub default_gst_percent: f64,

    /// Symbol printed in front of amounts by the presentation layer.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_store_name() -> String {
    "My Kirana Store".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            default_gst_percent: 0.0,
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete ledger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl LedgerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (ledger.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> LedgerResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
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
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> LedgerResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| LedgerError::ConfigSave("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Ledger config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(LedgerError::InvalidConfig(
                "database.path must not be empty".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(LedgerError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        let gst = self.store.default_gst_percent;
        if !gst.is_finite() || !(0.0..=100.0).contains(&gst) {
            return Err(LedgerError::InvalidConfig(format!(
                "store.default_gst_percent must be between 0 and 100, got {}",
                gst
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("KIRANA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(name) = std::env::var("KIRANA_STORE_NAME") {
            self.store.name = name;
        }

        if let Ok(gst) = std::env::var("KIRANA_GST_PERCENT") {
            match gst.parse::<f64>() {
                Ok(pct) => {
                    debug!(gst = pct, "Overriding default GST from environment");
                    self.store.default_gst_percent = pct;
                }
                Err(_) => warn!(gst = %gst, "Ignoring unparseable KIRANA_GST_PERCENT"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("in", "kirana", "ledger")
            .map(|dirs| dirs.config_dir().join("ledger.toml"))
    }

    /// Database pool configuration for this ledger.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}
