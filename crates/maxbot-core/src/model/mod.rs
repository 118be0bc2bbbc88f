//! Platform data model.
//!
//! Only the fields the framework routes on are typed; attachments and other
//! platform-specific payloads are kept as raw JSON.

mod api;
mod message;
mod update;

pub use api::{NewMessageBody, SimpleResult, Subscription, SubscriptionRequest, UpdateList};
pub use message::{Callback, ChatType, Message, MessageBody, Recipient, User};
pub use update::Update;
