//! Configuration for the worksheet client
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with DEALGAP__ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Calculation API configuration
    pub api: ApiConfig,

    /// Worksheet behaviour
    pub worksheet: WorksheetSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the calculation service
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WorksheetSettings {
    /// Quiet period after the last edit before calculating
    pub debounce_ms: u64,

    /// Calculate as soon as a property snapshot seeds the worksheet
    pub calculate_on_seed: bool,

    /// How long a saved preview stays usable
    pub preview_ttl_secs: u64,

    /// How long fetched assumption defaults are reused
    pub defaults_ttl_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("DEALGAP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Self::load_for(&environment)
    }

    /// Load configuration for a named environment
    pub fn load_for(environment: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment)?
            .set_default("api.base_url", "http://localhost:8000")?
            .set_default("api.timeout_secs", 30)?
            .set_default("worksheet.debounce_ms", 500)?
            .set_default("worksheet.calculate_on_seed", true)?
            .set_default("worksheet.preview_ttl_secs", 3600)?
            .set_default("worksheet.defaults_ttl_secs", 900)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (DEALGAP__ prefix)
            .add_source(
                Environment::with_prefix("DEALGAP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl WorksheetSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn preview_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.preview_ttl_secs as i64)
    }

    pub fn defaults_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.defaults_ttl_secs as i64)
    }
}

impl Default for WorksheetSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            calculate_on_seed: true,
            preview_ttl_secs: shared::PREVIEW_FRESHNESS_SECS as u64,
            defaults_ttl_secs: 900,
        }
    }
}
