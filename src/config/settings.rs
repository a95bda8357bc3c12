//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Worker server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Authentication configuration for the job routes
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Accepted bearer keys; empty means authentication is disabled
    #[serde(default)]
    pub api_keys: Vec<String>,
}

/// Job client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Queue endpoint base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-HTTP-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Total polling deadline
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Delay between status checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30000
}

fn default_poll_timeout() -> u64 {
    600
}

fn default_poll_interval() -> u64 {
    3
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            request_timeout_ms: default_request_timeout(),
            poll_timeout_secs: default_poll_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Inference engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_name")]
    pub name: String,
    /// Base URL of the sidecar diffusion service
    #[serde(default = "default_engine_url")]
    pub base_url: String,
    #[serde(default = "default_engine_timeout")]
    pub timeout_ms: u64,
}

fn default_engine_name() -> String {
    "image-edit".to_string()
}

fn default_engine_url() -> String {
    "http://127.0.0.1:7860".to_string()
}

fn default_engine_timeout() -> u64 {
    600000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            base_url: default_engine_url(),
            timeout_ms: default_engine_timeout(),
        }
    }
}

/// Job queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Maximum number of jobs waiting for the worker
    #[serde(default = "default_queue_size")]
    pub max_queue_size: usize,
}

fn default_queue_size() -> usize {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_queue_size(),
        }
    }
}

/// Client-side result storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "./output".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Load from configuration file when present
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with EDIT_SERVING_)
            .add_source(
                Environment::with_prefix("EDIT_SERVING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.engine.base_url.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "Engine base_url cannot be empty".to_string(),
            )));
        }

        if self.client.poll_interval_secs == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Poll interval cannot be 0".to_string(),
            )));
        }

        if self.client.poll_interval_secs > self.client.poll_timeout_secs {
            return Err(AppError::Config(config::ConfigError::Message(
                "Poll interval cannot exceed the poll timeout".to_string(),
            )));
        }

        if self.queue.max_queue_size == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Queue size cannot be 0".to_string(),
            )));
        }

        Ok(())
    }
}
