//! Handler traits for chat dispatch.
//!
//! Two kinds of handlers exist:
//!
//! - [`CommandHandler`]: receives the message and its parsed [`CommandLine`];
//!   used for registered commands and the unknown-command fallback.
//! - [`MessageHandler`]: receives only the message; used for the default
//!   fallback (plain text, empty text, non-text content).
//!
//! Handlers never return errors to the dispatcher. A handler that can fail
//! reports the failure itself, usually by logging or replying to the chat.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use maxbot_core::Message;

use crate::command::CommandLine;

/// Handles a parsed command.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Executes the command.
    async fn execute(&self, message: &Message, command: &CommandLine);
}

/// Handles a message that is not routed to a command.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Handles the message.
    async fn handle(&self, message: &Message);
}

/// A handler that knows the key it answers to.
///
/// Register with [`ChatBotBuilder::add`](crate::ChatBotBuilder::add).
pub trait Command {
    /// Returns the command key, without the marker.
    fn key(&self) -> &str;
}

/// A shared CommandHandler trait object.
pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

/// A shared MessageHandler trait object.
pub type BoxedMessageHandler = Arc<dyn MessageHandler>;

#[async_trait]
impl<H: CommandHandler + ?Sized> CommandHandler for Arc<H> {
    async fn execute(&self, message: &Message, command: &CommandLine) {
        (**self).execute(message, command).await
    }
}

#[async_trait]
impl<H: MessageHandler + ?Sized> MessageHandler for Arc<H> {
    async fn handle(&self, message: &Message) {
        (**self).handle(message).await
    }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// A [`CommandHandler`] backed by an async closure.
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps an async closure taking `(Message, CommandLine)` as a command handler.
///
/// The closure receives owned copies so the returned future can be `'static`.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Message, CommandLine) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> CommandHandler for HandlerFn<F>
where
    F: Fn(Message, CommandLine) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn execute(&self, message: &Message, command: &CommandLine) {
        (self.f)(message.clone(), command.clone()).await
    }
}

/// A [`MessageHandler`] backed by an async closure.
pub struct MessageFn<F> {
    f: F,
}

/// Wraps an async closure taking a `Message` as a message handler.
pub fn message_fn<F, Fut>(f: F) -> MessageFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    MessageFn { f }
}

#[async_trait]
impl<F, Fut> MessageHandler for MessageFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, message: &Message) {
        (self.f)(message.clone()).await
    }
}

/// Does nothing. The default for both fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn execute(&self, _message: &Message, _command: &CommandLine) {}
}

#[async_trait]
impl MessageHandler for NoopHandler {
    async fn handle(&self, _message: &Message) {}
}
