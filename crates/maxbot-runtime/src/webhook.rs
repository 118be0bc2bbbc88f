//! Bots that receive updates through a webhook subscription.

use async_trait::async_trait;
use maxbot_core::{
    ApiError, Bot, BotContainer, BotError, BotResult, BoxedClient, Lifecycle, LifecycleState,
    SubscriptionRequest, Update, UpdateHandler,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::WebhookConfig;

/// Subscription behavior of a [`WebhookBot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookBotOptions {
    /// Update types to subscribe to; all when `None`.
    pub update_types: Option<Vec<String>>,
    /// Remove subscriptions to any other URL on start.
    pub remove_old_subscriptions: bool,
    /// Remove the bot's own subscription on stop.
    pub remove_subscription_on_stop: bool,
}

impl From<&WebhookConfig> for WebhookBotOptions {
    fn from(config: &WebhookConfig) -> Self {
        Self {
            update_types: config.update_types.clone(),
            remove_old_subscriptions: config.remove_old_subscriptions,
            remove_subscription_on_stop: config.remove_subscription_on_stop,
        }
    }
}

/// A bot served by a [`WebhookBotContainer`](crate::WebhookBotContainer).
///
/// Starting the bot subscribes the container's public URL for its key;
/// updates then arrive through the container and go to the handler.
pub struct WebhookBot<H> {
    key: String,
    client: BoxedClient,
    options: WebhookBotOptions,
    lifecycle: Lifecycle,
    handler: H,
}

impl<H: UpdateHandler> WebhookBot<H> {
    /// Creates a bot with default options.
    pub fn new(key: impl Into<String>, client: BoxedClient, handler: H) -> Self {
        Self {
            key: key.into(),
            client,
            options: WebhookBotOptions::default(),
            lifecycle: Lifecycle::new(),
            handler,
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: WebhookBotOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &WebhookBotOptions {
        &self.options
    }

    /// Returns the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the platform client.
    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    async fn subscribe(&self, container: &dyn BotContainer) -> BotResult<()> {
        let url = container
            .webhook_url(&self.key)
            .ok_or_else(|| BotError::MissingWebhookUrl {
                key: self.key.clone(),
            })?;

        if self.options.remove_old_subscriptions {
            for subscription in self.client.subscriptions().await? {
                if subscription.url != url {
                    debug!(bot = %self.key, url = %subscription.url, "Removing old subscription");
                    self.client.unsubscribe(&subscription.url).await?;
                }
            }
        }

        let request = SubscriptionRequest::new(&url, self.options.update_types.clone());
        let result = self.client.subscribe(&request).await?;
        if !result.success {
            return Err(ApiError::Other(
                result
                    .message
                    .unwrap_or_else(|| "subscription rejected".to_string()),
            )
            .into());
        }

        info!(bot = %self.key, url = %url, "Webhook subscribed");
        Ok(())
    }
}

#[async_trait]
impl<H: UpdateHandler> Bot for WebhookBot<H> {
    fn key(&self) -> &str {
        &self.key
    }

    async fn on_update(&self, update: Update) -> Option<Value> {
        self.handler.on_update(update).await
    }

    async fn start(&self, container: &dyn BotContainer) -> BotResult<bool> {
        let Some(previous) = self.lifecycle.begin_start() else {
            return Ok(false);
        };

        match self.subscribe(container).await {
            Ok(()) => Ok(true),
            Err(e) => {
                self.lifecycle.rollback(previous);
                Err(e)
            }
        }
    }

    async fn stop(&self, container: &dyn BotContainer) -> BotResult<bool> {
        if !self.lifecycle.begin_stop() {
            return Ok(false);
        }

        if self.options.remove_subscription_on_stop
            && let Some(url) = container.webhook_url(&self.key)
        {
            self.client.unsubscribe(&url).await?;
            info!(bot = %self.key, url = %url, "Webhook unsubscribed");
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClient;
    use crate::WebhookBotContainer;
    use maxbot_core::{Subscription, update_fn};
    use std::sync::Arc;

    fn container() -> WebhookBotContainer {
        WebhookBotContainer::new()
            .with_path_prefix("/hooks")
            .with_public_url("https://bots.example.com")
    }

    fn silent() -> impl UpdateHandler {
        update_fn(|_update| async { None })
    }

    #[tokio::test]
    async fn test_start_subscribes_once() {
        let client = Arc::new(MockClient::default());
        let bot = WebhookBot::new("echo", client.clone(), silent());
        let container = container();

        assert!(bot.start(&container).await.unwrap());
        assert!(!bot.start(&container).await.unwrap());
        assert_eq!(bot.state(), LifecycleState::Started);
        assert_eq!(
            client.subscribed(),
            vec!["https://bots.example.com/hooks/echo".to_string()]
        );
    }

    #[tokio::test]
    async fn test_start_without_public_url() {
        let client = Arc::new(MockClient::default());
        let bot = WebhookBot::new("echo", client.clone(), silent());

        let err = bot.start(&WebhookBotContainer::new()).await.unwrap_err();
        assert!(matches!(err, BotError::MissingWebhookUrl { ref key } if key == "echo"));
        assert_eq!(bot.state(), LifecycleState::Created);
        assert!(client.subscribed().is_empty());
    }

    #[tokio::test]
    async fn test_remove_old_subscriptions() {
        let client = Arc::new(MockClient::default());
        client.set_subscriptions(vec![
            Subscription {
                url: "https://old.example.com/bot".into(),
                time: 0,
                update_types: None,
            },
            Subscription {
                url: "https://bots.example.com/hooks/echo".into(),
                time: 0,
                update_types: None,
            },
        ]);
        let bot = WebhookBot::new("echo", client.clone(), silent()).with_options(
            WebhookBotOptions {
                remove_old_subscriptions: true,
                ..Default::default()
            },
        );

        bot.start(&container()).await.unwrap();
        assert_eq!(
            client.unsubscribed(),
            vec!["https://old.example.com/bot".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rejected_subscription_rolls_back() {
        let client = Arc::new(MockClient::default());
        client.reject_subscriptions();
        let bot = WebhookBot::new("echo", client.clone(), silent());

        assert!(bot.start(&container()).await.is_err());
        assert_eq!(bot.state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn test_stop_removes_subscription_when_asked() {
        let client = Arc::new(MockClient::default());
        let bot = WebhookBot::new("echo", client.clone(), silent()).with_options(
            WebhookBotOptions {
                remove_subscription_on_stop: true,
                ..Default::default()
            },
        );
        let container = container();

        assert!(!bot.stop(&container).await.unwrap());
        bot.start(&container).await.unwrap();
        assert!(bot.stop(&container).await.unwrap());
        assert_eq!(bot.state(), LifecycleState::Stopped);
        assert_eq!(
            client.unsubscribed(),
            vec!["https://bots.example.com/hooks/echo".to_string()]
        );
    }

    #[tokio::test]
    async fn test_stop_keeps_subscription_by_default() {
        let client = Arc::new(MockClient::default());
        let bot = WebhookBot::new("echo", client.clone(), silent());
        let container = container();

        bot.start(&container).await.unwrap();
        bot.stop(&container).await.unwrap();
        assert!(client.unsubscribed().is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let config = WebhookConfig {
            update_types: Some(vec!["message_created".into()]),
            remove_old_subscriptions: true,
            ..Default::default()
        };
        let options = WebhookBotOptions::from(&config);
        assert_eq!(options.update_types, Some(vec!["message_created".into()]));
        assert!(options.remove_old_subscriptions);
        assert!(!options.remove_subscription_on_stop);
    }
}
