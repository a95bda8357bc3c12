//! Configuration module

pub mod settings;

pub use settings::{
    AuthConfig, ClientConfig, EngineConfig, LoggingConfig, QueueConfig, ServerConfig, Settings,
    StorageConfig,
};
