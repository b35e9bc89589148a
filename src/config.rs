//! Configuration loading and validation.
//!
//! Configuration is loaded from a TOML file; every section has defaults so an
//! empty file (or no file at all, via [`Config::default`]) is valid.

use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub anonymous: AnonymousConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote cart API endpoint and HTTP behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the cart API, e.g. `https://shop.example.com/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Attempts for idempotent reads; mutations are never retried.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default)]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_retry_max_attempts() -> u32 {
    1
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_backoff_ms: 0,
        }
    }
}

/// Anonymous cart cookie slot.
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymousConfig {
    /// Key the serialized cart is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Expiry window for the stored cart.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
}

fn default_storage_key() -> String {
    "cart".into()
}

fn default_ttl_days() -> u32 {
    7
}

impl Default for AnonymousConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            ttl_days: default_ttl_days(),
        }
    }
}

/// Cart store behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Quiet period before a burst of authenticated quantity updates is
    /// flushed as a single remote call.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Capacity of the count broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_event_capacity() -> usize {
    16
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            anonymous: AnonymousConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote.base_url.is_empty() {
            return Err(ConfigError::MissingField { field: "remote.base_url" }.into());
        }
        Url::parse(&self.remote.base_url)?;
        if self.anonymous.storage_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "anonymous.storage_key",
            }
            .into());
        }
        if self.anonymous.ttl_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "anonymous.ttl_days",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.store.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.event_capacity",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}
