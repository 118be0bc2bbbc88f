//! # maxbot
//!
//! A bot framework for the Max messaging platform.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────────┐     ┌─────────────┐     ┌─────────┐
//! │ HTTP server  │────▶│ WebhookBotContainer │────▶│ WebhookBot  │────▶│ ChatBot │──▶ handlers
//! │ (transport)  │     │  path -> bot        │     └─────────────┘     │         │
//! └──────────────┘     └─────────────────────┘                         │         │
//! ┌──────────────┐     ┌─────────────────────┐                         │         │
//! │ Platform API │────▶│ LongPollingBot      │────────────────────────▶│         │──▶ handlers
//! └──────────────┘     └─────────────────────┘                         └─────────┘
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, serves webhooks and
//!   drives bot lifecycles
//! - **Bots**: a key, an [`UpdateHandler`](prelude::UpdateHandler) and a
//!   delivery mode (webhook or long polling)
//! - **ChatBot**: routes each message to one command handler, or to the
//!   default or unknown-command fallback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use maxbot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BotRuntime::new();
//!     let client = runtime.default_api_client()?;
//!
//!     let chat = ChatBot::builder()
//!         .on("ping", handler_fn(|message, _command| async move {
//!             info!(chat = ?message.chat_id(), "pong");
//!         }))
//!         .build();
//!
//!     runtime.register_webhook_bot(
//!         WebhookBot::new("ping", client, chat).with_options(runtime.webhook_bot_options()),
//!     )?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `command` (default): typed command arguments through clap
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use maxbot_core as core;
pub use maxbot_framework as framework;
pub use maxbot_runtime as runtime;
pub use maxbot_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use maxbot::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use maxbot_runtime::{
        BotRuntime, LongPollingBot, LongPollingBotOptions, MaxbotConfig, RuntimeError,
        RuntimeResult, WebhookBot, WebhookBotContainer, WebhookBotOptions,
    };

    // Chat dispatch
    pub use maxbot_framework::{
        ChatBot, ChatBotBuilder, Command, CommandHandler, CommandLine, CommandParser,
        MessageHandler, handler_fn, message_fn,
    };

    // Core contracts and platform model
    pub use maxbot_core::{
        Bot, BotContainer, BoxedBot, BoxedClient, Message, NewMessageBody, PlatformClient,
        Update, UpdateHandler, update_fn,
    };

    // Logging macros
    pub use maxbot_runtime::prelude::*;
}
