//! Runtime error types.

use maxbot_core::ApiError;
use maxbot_transport::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by the bot container's registration calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another bot already occupies the path.
    #[error("bot already registered by path: {path}")]
    AlreadyRegistered {
        /// The occupied path.
        path: String,
    },

    /// The bot has no current registration.
    #[error("bot is not registered: {key}")]
    NotRegistered {
        /// Key of the bot passed to `unregister`.
        key: String,
    },
}

impl RegistryError {
    /// Creates an already-registered error.
    pub fn already_registered(path: impl Into<String>) -> Self {
        Self::AlreadyRegistered { path: path.into() }
    }

    /// Creates a not-registered error.
    pub fn not_registered(key: impl Into<String>) -> Self {
        Self::NotRegistered { key: key.into() }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bot registration failed.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The webhook server could not start.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The platform API client could not be built.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Installing the shutdown signal handler failed.
    #[error("Signal handler error: {0}")]
    Signal(#[source] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_messages() {
        let err = RegistryError::already_registered("/echo");
        assert_eq!(err.to_string(), "bot already registered by path: /echo");

        let err = RegistryError::not_registered("echo");
        assert_eq!(err.to_string(), "bot is not registered: echo");
    }

    #[test]
    fn test_runtime_error_from_registry() {
        let err: RuntimeError = RegistryError::not_registered("x").into();
        assert!(matches!(err, RuntimeError::Registry(_)));
    }
}
