//! # maxbot Framework
//!
//! High-level components for writing chat bots.
//!
//! This layer provides:
//! - Command line parsing (`/key arg arg ...`) via [`CommandParser`]
//! - Handler traits for commands and plain messages, with closure adapters
//! - [`ChatBot`], the dispatcher that routes each message to exactly one
//!   handler, with default and unknown-command fallbacks
//! - Typed argument parsing through clap (with the `command` feature)
//!
//! ```rust,ignore
//! use maxbot_framework::{ChatBot, handler_fn, message_fn};
//!
//! let chat = ChatBot::builder()
//!     .on("ping", handler_fn(|message, _cmd| async move {
//!         tracing::info!(chat = ?message.chat_id(), "pong");
//!     }))
//!     .by_default(message_fn(|_message| async {}))
//!     .build();
//! ```

pub mod chat;
pub mod command;
pub mod handler;

pub use chat::{ChatBot, ChatBotBuilder, Route};
pub use command::{CommandLine, CommandParser, DEFAULT_MARKER, try_parse};
pub use handler::{
    BoxedCommandHandler, BoxedMessageHandler, Command, CommandHandler, HandlerFn, MessageFn,
    MessageHandler, NoopHandler, handler_fn, message_fn,
};
