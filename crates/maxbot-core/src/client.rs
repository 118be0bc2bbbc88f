//! Platform API client contract.
//!
//! The framework only needs a handful of calls: webhook subscription
//! management, update polling, and sending text replies. The HTTP
//! implementation lives in `maxbot-transport`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::model::{
    Message, NewMessageBody, SimpleResult, Subscription, SubscriptionRequest, UpdateList,
};

/// Query for the long-polling `updates` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatesQuery {
    /// Maximum number of updates to return.
    pub limit: Option<u32>,
    /// Server-side wait time in seconds.
    pub timeout: Option<u32>,
    /// Marker returned by the previous call.
    pub marker: Option<i64>,
    /// Update types to receive; `None` means all.
    pub types: Option<Vec<String>>,
}

/// Outbound calls to the messaging platform.
#[async_trait]
pub trait PlatformClient: Send + Sync + 'static {
    /// Lists the bot's webhook subscriptions.
    async fn subscriptions(&self) -> ApiResult<Vec<Subscription>>;

    /// Subscribes a webhook URL.
    async fn subscribe(&self, request: &SubscriptionRequest) -> ApiResult<SimpleResult>;

    /// Removes the webhook subscription for `url`.
    async fn unsubscribe(&self, url: &str) -> ApiResult<SimpleResult>;

    /// Fetches pending updates.
    async fn get_updates(&self, query: &UpdatesQuery) -> ApiResult<UpdateList>;

    /// Sends a message to a chat.
    async fn send_message(&self, chat_id: i64, body: &NewMessageBody) -> ApiResult<Message>;
}

/// A shared PlatformClient trait object.
pub type BoxedClient = Arc<dyn PlatformClient>;
