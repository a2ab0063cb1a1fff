//! Service Settings
//!
//! Layered from an optional TOML file and `TEA_MONITOR__*` environment
//! variables (e.g. `TEA_MONITOR__MONITOR__POLL_INTERVAL_MS=500`).

use crate::rate_limit::RateLimits;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use health_classifier::{ConfigurationError, ParameterSpec, ParameterTable};
use monitor::MonitorConfig;
use serde::Deserialize;

/// Default settings file, looked up without extension
pub const DEFAULT_SETTINGS_FILE: &str = "tea-monitor";

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// All service settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub rate_limit: RateLimits,
    pub monitor: MonitorConfig,
    /// Replacement specs for individual parameters
    pub parameters: Vec<ParameterSpec>,
}

impl Settings {
    /// Load settings from `path` (missing file is fine) and the environment
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::with_name(path).required(false)))
    }

    /// Finish a builder with the environment layer and deserialize
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix("TEA_MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Standard parameter table with the configured overrides applied
    pub fn parameter_table(&self) -> Result<ParameterTable, ConfigurationError> {
        ParameterTable::with_overrides(self.parameters.clone())
    }
}
