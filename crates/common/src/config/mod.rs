//! Configuration management for OfficeHub hosts
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Remote record service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Durable session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Capture device and position source configuration
    #[serde(default)]
    pub device: DeviceConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Base URL of the record service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// File holding the persisted session keys
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Still image used as the capture device's frame source
    pub capture_source: Option<PathBuf>,

    /// MIME type of the capture source
    #[serde(default = "default_capture_mime")]
    pub capture_mime: String,

    /// Fixed latitude reported by the position source
    pub latitude: Option<f64>,

    /// Fixed longitude reported by the position source
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_user_agent() -> String { format!("officehub/{}", crate::VERSION) }
fn default_session_file() -> PathBuf { PathBuf::from(".officehub/session.json") }
fn default_capture_mime() -> String { "image/jpeg".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            capture_source: None,
            capture_mime: default_capture_mime(),
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
        }
    }
}

impl ServiceConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("service.base_url", default_base_url())?
            .set_default("observability.log_level", default_log_level())?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVICE__BASE_URL=https://records.example.com
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific config file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Fixed coordinates for the position source, when both halves are configured
    pub fn fixed_position(&self) -> Option<(f64, f64)> {
        self.device.latitude.zip(self.device.longitude)
    }
}
