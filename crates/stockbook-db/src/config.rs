//! # Application Configuration
//!
//! Settings for the database, the inventory rules and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKBOOK_DB_PATH=/var/lib/stockbook/stockbook.db                  │
//! │     STOCKBOOK_MIN_STOCK_POLICY=hard                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockbook/config.toml (Linux)                            │
//! │     ~/Library/Application Support/com.stockbook.stockbook/config.toml  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./stockbook.db, soft minimum-stock policy                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # config.toml
//! [database]
//! path = "stockbook.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//! run_migrations = true
//!
//! [inventory]
//! min_stock_policy = "soft"  # soft | hard
//!
//! [logging]
//! filter = "info,stockbook=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use stockbook_core::MinStockPolicy;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

/// Where the database lives and how the pool behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite file, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Lock wait limit for order transactions (milliseconds).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("stockbook.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Inventory Settings
// =============================================================================

/// Stock rules applied by the order services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySettings {
    /// What a sale does when it would drop stock under the minimum.
    #[serde(default)]
    pub min_stock_policy: MinStockPolicy,
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,stockbook=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Complete Stockbook configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Replace with the TOML file, if it exists
    /// 3. Apply `STOCKBOOK_*` environment overrides
    /// 4. Validate
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
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

    /// Like [`load`](Self::load), but falls back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("no config directory available".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        info!(?path, "Config saved");
        Ok(())
    }

    /// Checks values that would otherwise fail later at connect time.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path cannot be empty".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Pool configuration derived from the `[database]` section.
    pub fn to_db_config(&self) -> DbConfig {
        let config = if self.database.path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
        };

        config
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .run_migrations(self.database.run_migrations)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("STOCKBOOK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("STOCKBOOK_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid STOCKBOOK_MAX_CONNECTIONS"),
            }
        }

        if let Ok(ms) = std::env::var("STOCKBOOK_BUSY_TIMEOUT_MS") {
            match ms.parse::<u64>() {
                Ok(n) => self.database.busy_timeout_ms = n,
                Err(_) => warn!(value = %ms, "Ignoring invalid STOCKBOOK_BUSY_TIMEOUT_MS"),
            }
        }

        if let Ok(policy) = std::env::var("STOCKBOOK_MIN_STOCK_POLICY") {
            match policy.parse::<MinStockPolicy>() {
                Ok(parsed) => {
                    debug!(policy = %parsed, "Overriding min stock policy from environment");
                    self.inventory.min_stock_policy = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring invalid STOCKBOOK_MIN_STOCK_POLICY"),
            }
        }

        if let Ok(filter) = std::env::var("STOCKBOOK_LOG") {
            self.logging.filter = filter;
        }
    }

    /// `<config dir>/config.toml` for the current platform.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockbook", "stockbook")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
