//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a small TOML file:
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [valve]
//! initial_mode = "passthrough"
//! bus_capacity = 256
//! ```
//!
//! Every field has a built-in default, and a missing file is not an error:
//! callers get the defaults plus a warning.

use crate::events::ValveMode;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "FPC_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Valve construction settings (optional)
    #[serde(default)]
    pub valve: ValveSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Settings used when constructing a valve and its event bus
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ValveSettings {
    /// Mode the valve starts in
    #[serde(default)]
    pub initial_mode: ValveMode,

    /// Per-subscriber buffer of the event bus feeding the valve
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl Default for ValveSettings {
    fn default() -> Self {
        Self {
            initial_mode: ValveMode::default(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bus_capacity() -> usize {
    100
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse configuration from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, degrading to defaults when nothing usable is found
    ///
    /// A missing file is logged at warn level; a present but invalid file is
    /// an error since silently ignoring it would hide a user mistake.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                warn!("Config file {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => {
                warn!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "invalid logging.level '{}'",
                self.logging.level
            )));
        }
        if self.valve.bus_capacity == 0 {
            return Err(Error::Config("valve.bus_capacity must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. `FPC_CONFIG` environment variable
/// 3. Platform config directory (`<config_dir>/fpcompare/config.toml`), if it exists
/// 4. None (compiled defaults)
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver; `cli_path` is the value of a `--config` argument
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Resolve the config file path, if any source names one
    pub fn resolve(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path().filter(|p| p.exists())
    }
}

/// Platform config file location (not checked for existence)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fpcompare").join("config.toml"))
}
