//! Configuration management module
//!
//! Loads settings from built-in defaults overlaid by `AIRINDEX_`-prefixed
//! environment variables, using `__` for nesting
//! (`AIRINDEX_SERVER__PORT=8080`, `AIRINDEX_SEED__ENABLED=true`).

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Synthetic data configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSettings {
    /// Interval in milliseconds between feed records (0 disables the feed)
    pub feed_interval_ms: u64,
    /// Default missing-value probability for generated readings
    pub missing_probability: f64,
}

/// Startup seeding configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSettings {
    pub enabled: bool,
    pub stations: usize,
    pub records_per_station: usize,
    pub missing_probability: f64,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub generator: GeneratorSettings,
    pub seed: SeedSettings,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load(Self::environment())
    }

    /// Load settings from an explicit variable map instead of the process environment
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, SettingsError> {
        Self::load(Self::environment().source(Some(vars)))
    }

    fn environment() -> Environment {
        Environment::with_prefix("AIRINDEX")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load(environment: Environment) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("generator.feed_interval_ms", 0)?
            .set_default("generator.missing_probability", 0.2)?
            .set_default("seed.enabled", false)?
            .set_default("seed.stations", 5)?
            .set_default("seed.records_per_station", 10)?
            .set_default("seed.missing_probability", 0.15)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("generator.missing_probability", self.generator.missing_probability),
            ("seed.missing_probability", self.seed.missing_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::Invalid(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
