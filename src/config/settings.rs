use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::gateway::http::DEFAULT_BASE_URL;
use crate::metrics::{ScorecardProfile, TimestampFormat, MAX_PAGE_SIZE};

pub const API_KEY_VAR: &str = "HOUSECALL_PRO_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub metrics: MetricsConfig,
    pub scorecard: ScorecardProfile,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub auth_scheme: String,
    pub timeout_secs: u64,
    pub timestamp_format: TimestampFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: "Token".to_string(),
            timeout_secs: 30,
            timestamp_format: TimestampFormat::Naive,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub page_size: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then `config/{CONFIG_ENV}`, then `SCORECARD__*` variables
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Self::environment())
            .build()?;

        config.try_deserialize()
    }

    /// Defaults, then the given file, then `SCORECARD__*` variables
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(Self::environment())
            .build()?;

        config.try_deserialize()
    }

    pub fn api_key() -> Result<String> {
        env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} environment variable not set", API_KEY_VAR))
    }

    fn environment() -> Environment {
        Environment::with_prefix("SCORECARD")
            .prefix_separator("__")
            .separator("__")
    }
}
