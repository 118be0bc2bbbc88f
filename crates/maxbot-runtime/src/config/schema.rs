//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MaxbotConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Platform API client settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Webhook server and subscription settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Long-polling settings.
    #[serde(default)]
    pub long_polling: LongPollingConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing::Level`.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; otherwise falls back to `Full`.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Number of rotated files to keep; unlimited when unset.
    #[serde(default)]
    pub max_files: Option<usize>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-target levels, e.g. `maxbot_runtime = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            max_files: None,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
        }
    }
}

// =============================================================================
// Platform API
// =============================================================================

/// Platform API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bot token; usually supplied through `MAXBOT_API__ACCESS_TOKEN`.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    maxbot_transport::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Mount point of the bot container; bots live at `{path_prefix}/{key}`.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,

    /// Externally reachable base URL, e.g. `https://bots.example.com`.
    ///
    /// Webhook bots cannot subscribe without it.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Update types to subscribe to; all when unset.
    #[serde(default)]
    pub update_types: Option<Vec<String>>,

    /// Remove subscriptions to other URLs on start.
    #[serde(default)]
    pub remove_old_subscriptions: bool,

    /// Remove the bot's own subscription on stop.
    #[serde(default)]
    pub remove_subscription_on_stop: bool,
}

impl WebhookConfig {
    /// Returns the `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path_prefix: default_path_prefix(),
            public_url: None,
            update_types: None,
            remove_old_subscriptions: false,
            remove_subscription_on_stop: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path_prefix() -> String {
    "/webhook".to_string()
}

// =============================================================================
// Long polling
// =============================================================================

/// Long-polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongPollingConfig {
    /// Server-side wait per request in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u32,

    /// Maximum updates per request (1..=1000); server default when unset.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Update types to receive; all when unset.
    #[serde(default)]
    pub update_types: Option<Vec<String>>,

    /// Remove webhook subscriptions before polling.
    #[serde(default = "default_remove_webhook")]
    pub remove_webhook: bool,

    /// Pause after a failed request in milliseconds.
    #[serde(default = "default_error_pause_ms")]
    pub error_pause_ms: u64,
}

impl Default for LongPollingConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            limit: None,
            update_types: None,
            remove_webhook: default_remove_webhook(),
            error_pause_ms: default_error_pause_ms(),
        }
    }
}

fn default_request_timeout_secs() -> u32 {
    30
}

fn default_remove_webhook() -> bool {
    true
}

fn default_error_pause_ms() -> u64 {
    1000
}
