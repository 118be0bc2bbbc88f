//! maxbot Runtime - Orchestration layer for the maxbot framework.
//!
//! This crate provides:
//! - The webhook bot registry and router (`WebhookBotContainer`)
//! - Bot delivery modes (`WebhookBot`, `LongPollingBot`)
//! - Runtime orchestration (`BotRuntime`)
//! - Layered configuration and logging setup
//!
//! ```ignore
//! use maxbot_runtime::{BotRuntime, LongPollingBot};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BotRuntime::new();
//!     let client = runtime.default_api_client()?;
//!
//!     runtime.add_long_polling_bot(LongPollingBot::with_options(
//!         "echo",
//!         client,
//!         chat,
//!         runtime.long_polling_options(),
//!     ));
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Webhook Routing
//!
//! Webhook bots live in the container under `/<key>`. The runtime serves the
//! container below the configured `webhook.path_prefix`, so a bot keyed
//! `echo` receives `POST /webhook/echo` and subscribes
//! `<webhook.public_url>/webhook/echo` when it starts.

pub mod config;
pub mod container;
pub mod error;
pub mod logging;
pub mod longpolling;
pub mod runtime;
pub mod webhook;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::{
    ApiConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, LongPollingConfig,
    MaxbotConfig, Profile, WebhookConfig,
};
pub use container::{HookReport, WebhookBotContainer};
pub use error::{RegistryError, RegistryResult, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use longpolling::{LongPollingBot, LongPollingBotOptions};
pub use runtime::{BotRuntime, RuntimeBuilder};
pub use webhook::{WebhookBot, WebhookBotOptions};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
