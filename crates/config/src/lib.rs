//! Configuration management for the avatar backend
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (AVATAR__ prefix)

pub mod settings;

pub use settings::{
    load_settings, LipSyncConfig, LlmConfig, ObservabilityConfig, PipelineConfig, ServerConfig,
    Settings, SttConfig, TtsConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
