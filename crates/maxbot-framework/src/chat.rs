//! Chat command dispatcher.
//!
//! [`ChatBot`] routes every message to exactly one handler:
//!
//! 1. No text, or blank text: the **default handler**
//! 2. Text that is not a command line: the **default handler**
//! 3. A command with a registered key: that **command handler**
//! 4. A command with an unknown key: the **unknown-command handler**, which
//!    still receives the parsed command line so it can name the command
//!
//! The handler table is fixed at build time. Dispatch never fails; not finding
//! a handler is a routing decision, not an error.
//!
//! ```rust,ignore
//! use maxbot_framework::{ChatBot, handler_fn, message_fn};
//!
//! let chat = ChatBot::builder()
//!     .on("echo", handler_fn(|message, cmd| async move {
//!         reply(message.chat_id(), cmd.joined_args()).await;
//!     }))
//!     .on_unknown_command(handler_fn(|message, cmd| async move {
//!         reply(message.chat_id(), format!("unknown command /{}", cmd.key())).await;
//!     }))
//!     .build();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use maxbot_core::{Message, Update, UpdateHandler};
use serde_json::Value;
use tracing::{Instrument, debug, debug_span, trace};

use crate::command::CommandParser;
use crate::handler::{
    BoxedCommandHandler, BoxedMessageHandler, Command, CommandHandler, MessageHandler,
    NoopHandler,
};

/// Which handler a message was routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The default handler.
    Default,
    /// The handler registered for this key.
    Command(String),
    /// The unknown-command handler, with the key that had no handler.
    Unknown(String),
}

/// Routes messages to command handlers.
///
/// # Thread Safety
///
/// `ChatBot` is immutable after construction and can be shared across tasks
/// behind an `Arc` without locking.
pub struct ChatBot {
    parser: CommandParser,
    handlers: HashMap<String, BoxedCommandHandler>,
    default_handler: BoxedMessageHandler,
    unknown_command_handler: BoxedCommandHandler,
}

impl ChatBot {
    /// Creates a dispatcher from a finished handler table and both fallbacks.
    pub fn new(
        handlers: HashMap<String, BoxedCommandHandler>,
        default_handler: BoxedMessageHandler,
        unknown_command_handler: BoxedCommandHandler,
    ) -> Self {
        Self {
            parser: CommandParser::new(),
            handlers,
            default_handler,
            unknown_command_handler,
        }
    }

    /// Creates a builder.
    pub fn builder() -> ChatBotBuilder {
        ChatBotBuilder::new()
    }

    /// Replaces the command parser.
    pub fn with_parser(mut self, parser: CommandParser) -> Self {
        self.parser = parser;
        self
    }

    /// Returns the command parser.
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Returns whether a handler is registered for `key`.
    pub fn has_command(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Returns the registered command keys, sorted.
    pub fn command_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Dispatches one message to exactly one handler.
    pub async fn reply_on(&self, message: &Message) -> Route {
        let span = debug_span!("reply_on", chat_id = ?message.chat_id());
        self.dispatch(message).instrument(span).await
    }

    async fn dispatch(&self, message: &Message) -> Route {
        let text = match message.text() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                trace!("No text, using default handler");
                self.default_handler.handle(message).await;
                return Route::Default;
            }
        };

        let Some(command) = self.parser.try_parse(text) else {
            trace!("Not a command, using default handler");
            self.default_handler.handle(message).await;
            return Route::Default;
        };

        match self.handlers.get(command.key()) {
            Some(handler) => {
                debug!(command = %command.key(), args = command.args().len(), "Executing command");
                handler.execute(message, &command).await;
                Route::Command(command.key().to_owned())
            }
            None => {
                debug!(command = %command.key(), "Unknown command");
                self.unknown_command_handler.execute(message, &command).await;
                Route::Unknown(command.key().to_owned())
            }
        }
    }
}

impl std::fmt::Debug for ChatBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBot")
            .field("parser", &self.parser)
            .field("commands", &self.command_keys())
            .finish()
    }
}

/// Routes `message_created` updates through [`ChatBot::reply_on`].
///
/// Other updates are ignored. The response is always empty; replies go out
/// through the platform client inside the handlers.
#[async_trait]
impl UpdateHandler for ChatBot {
    async fn on_update(&self, update: Update) -> Option<Value> {
        match update {
            Update::MessageCreated { message, .. } => {
                self.reply_on(&message).await;
            }
            other => {
                trace!(update_type = other.update_type(), "Ignoring update");
            }
        }
        None
    }
}

// =============================================================================
// ChatBotBuilder
// =============================================================================

/// Builder for [`ChatBot`].
///
/// Unset fallbacks default to [`NoopHandler`]. Registering a key twice keeps
/// the last handler.
pub struct ChatBotBuilder {
    parser: CommandParser,
    handlers: HashMap<String, BoxedCommandHandler>,
    default_handler: Option<BoxedMessageHandler>,
    unknown_command_handler: Option<BoxedCommandHandler>,
}

impl ChatBotBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            parser: CommandParser::new(),
            handlers: HashMap::new(),
            default_handler: None,
            unknown_command_handler: None,
        }
    }

    /// Registers a handler for `key`.
    pub fn on(mut self, key: impl Into<String>, handler: impl CommandHandler) -> Self {
        let key = key.into();
        if self.handlers.insert(key.clone(), Arc::new(handler)).is_some() {
            debug!(command = %key, "Replaced command handler");
        }
        self
    }

    /// Registers a handler under its own key.
    pub fn add<T>(self, handler: T) -> Self
    where
        T: CommandHandler + Command,
    {
        let key = handler.key().to_owned();
        self.on(key, handler)
    }

    /// Sets the handler for plain text and messages without text.
    pub fn by_default(mut self, handler: impl MessageHandler) -> Self {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    /// Sets the handler for commands without a registered handler.
    pub fn on_unknown_command(mut self, handler: impl CommandHandler) -> Self {
        self.unknown_command_handler = Some(Arc::new(handler));
        self
    }

    /// Sets the command parser.
    pub fn parser(mut self, parser: CommandParser) -> Self {
        self.parser = parser;
        self
    }

    /// Builds the dispatcher.
    pub fn build(self) -> ChatBot {
        ChatBot::new(
            self.handlers,
            self.default_handler.unwrap_or_else(|| Arc::new(NoopHandler)),
            self.unknown_command_handler
                .unwrap_or_else(|| Arc::new(NoopHandler)),
        )
        .with_parser(self.parser)
    }
}

impl Default for ChatBotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
