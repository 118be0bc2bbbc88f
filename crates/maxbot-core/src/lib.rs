//! # maxbot Core
//!
//! The core building blocks of the maxbot framework.
//!
//! This crate is deliberately small. It defines the contracts that the rest of
//! the workspace plugs into:
//!
//! - **Platform model**: the subset of the messaging platform schema the
//!   framework routes on ([`Update`], [`Message`], subscription payloads)
//! - **Bots**: the [`Bot`] trait with its stable key, lifecycle hooks and
//!   [`on_update`](Bot::on_update) entry point, plus [`UpdateHandler`] for the
//!   logic a bot delegates to
//! - **Serialization**: the [`Serializer`] collaborator and its JSON default
//! - **Lifecycle**: the atomic [`Lifecycle`] state shared by bot implementations
//! - **Collaborators**: [`PlatformClient`] for outbound API calls and
//!   [`WebhookHandler`] for inbound HTTP
//!
//! ## Request Flow
//!
//! ```text
//! ┌────────────┐   ┌──────────────────┐   ┌───────┐   ┌─────────┐
//! │ HTTP layer │──▶│ WebhookHandler   │──▶│  Bot  │──▶│ ChatBot │
//! │ (external) │   │ (bot container)  │   │       │   │         │
//! └────────────┘   └──────────────────┘   └───────┘   └─────────┘
//! ```

pub mod bot;
pub mod client;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod serializer;
pub mod webhook;

pub use bot::{Bot, BotContainer, BoxedBot, UpdateFn, UpdateHandler, update_fn};
pub use client::{BoxedClient, PlatformClient, UpdatesQuery};
pub use error::{
    ApiError, ApiResult, BotError, BotResult, SerializationError, SerializationResult,
    WebhookError, WebhookResult,
};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use model::{
    Callback, ChatType, Message, MessageBody, NewMessageBody, Recipient, SimpleResult,
    Subscription, SubscriptionRequest, Update, UpdateList, User,
};
pub use serializer::{JsonSerializer, Serializer};
pub use webhook::WebhookHandler;
