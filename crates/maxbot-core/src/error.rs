//! Unified error types for the maxbot core.
//!
//! Registry and configuration errors live in `maxbot-runtime`; this module
//! only holds the errors that cross crate boundaries.

use thiserror::Error;

// =============================================================================
// Serialization Errors
// =============================================================================

/// Errors raised by a [`Serializer`](crate::Serializer).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializationError {
    /// The inbound payload does not match the update schema.
    #[error("failed to parse update: {0}")]
    Deserialize(String),

    /// The bot's response could not be written out.
    #[error("failed to serialize response: {0}")]
    Serialize(String),
}

// =============================================================================
// Webhook Errors
// =============================================================================

/// Errors returned while routing an inbound webhook request.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// No bot is registered under the request path.
    #[error("no bot registered by path: {path}")]
    BotNotFound {
        /// The request path that did not match.
        path: String,
    },

    /// The payload or the response failed (de)serialization.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl WebhookError {
    /// Creates a bot-not-found error.
    pub fn bot_not_found(path: impl Into<String>) -> Self {
        Self::BotNotFound { path: path.into() }
    }

    /// Returns the HTTP status code this error maps to.
    ///
    /// Routing failures are client-visible (404); serialization failures are
    /// internal (500).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BotNotFound { .. } => 404,
            Self::Serialization(_) => 500,
        }
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for platform API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Bot Errors
// =============================================================================

/// Errors raised by bot lifecycle hooks.
///
/// The bot container logs these and carries on with the remaining bots.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// The container cannot produce a public URL to subscribe.
    #[error("no public webhook URL available for bot '{key}'")]
    MissingWebhookUrl {
        /// Key of the bot being started.
        key: String,
    },

    /// A platform API call made by the hook failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Internal bot error.
    #[error("bot error: {0}")]
    Internal(String),
}

impl BotError {
    /// Creates an internal bot error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for serializer operations.
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Result type for webhook routing.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for bot lifecycle hooks.
pub type BotResult<T> = Result<T, BotError>;
