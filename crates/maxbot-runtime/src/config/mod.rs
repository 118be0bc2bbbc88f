//! Configuration module for the maxbot runtime.
//!
//! This module provides layered configuration loading and validation for
//! logging, the platform API client, the webhook server, and long polling.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ApiConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, LongPollingConfig,
    MaxbotConfig, SpanEventConfig, WebhookConfig,
};
pub use validation::validate_config;
