//! Bots that fetch updates by long polling.
//!
//! The polling loop runs in its own task. Each request waits server-side for
//! up to `request_timeout`; updates are handed to the handler one at a time,
//! in delivery order. A failed request is logged and retried after a fixed
//! pause.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use maxbot_core::{
    ApiResult, Bot, BotContainer, BotResult, BoxedClient, Lifecycle, LifecycleState, Update,
    UpdateHandler, UpdatesQuery,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::LongPollingConfig;

/// Polling behavior of a [`LongPollingBot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongPollingBotOptions {
    /// Server-side wait per request.
    pub request_timeout: Duration,
    /// Maximum updates per request; server default when `None`.
    pub limit: Option<u32>,
    /// Update types to receive; all when `None`.
    pub update_types: Option<Vec<String>>,
    /// Remove all webhook subscriptions before polling.
    pub remove_webhook: bool,
    /// Pause after a failed request.
    pub error_pause: Duration,
}

impl Default for LongPollingBotOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            limit: None,
            update_types: None,
            remove_webhook: true,
            error_pause: Duration::from_secs(1),
        }
    }
}

impl From<&LongPollingConfig> for LongPollingBotOptions {
    fn from(config: &LongPollingConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(u64::from(config.request_timeout_secs)),
            limit: config.limit,
            update_types: config.update_types.clone(),
            remove_webhook: config.remove_webhook,
            error_pause: Duration::from_millis(config.error_pause_ms),
        }
    }
}

struct Poller<H> {
    key: String,
    client: BoxedClient,
    options: LongPollingBotOptions,
    handler: H,
}

impl<H: UpdateHandler> Poller<H> {
    async fn run(self: Arc<Self>, token: CancellationToken) {
        info!(bot = %self.key, "Long polling started");

        if self.options.remove_webhook {
            tokio::select! {
                _ = token.cancelled() => return,
                result = self.remove_webhooks() => {
                    if let Err(e) = result {
                        warn!(bot = %self.key, error = %e, "Failed to remove webhook subscriptions");
                    }
                }
            }
        }

        let mut marker = None;
        loop {
            let query = self.query(marker);
            let result = tokio::select! {
                _ = token.cancelled() => break,
                result = self.client.get_updates(&query) => result,
            };

            match result {
                Ok(list) => {
                    if list.marker.is_some() {
                        marker = list.marker;
                    }
                    trace!(bot = %self.key, count = list.updates.len(), "Received updates");
                    for update in list.updates {
                        if token.is_cancelled() {
                            break;
                        }
                        self.dispatch(update).await;
                    }
                }
                Err(e) => {
                    warn!(
                        bot = %self.key,
                        error = %e,
                        pause_ms = self.options.error_pause.as_millis() as u64,
                        "Failed to fetch updates"
                    );
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(self.options.error_pause) => {}
                    }
                }
            }
        }

        info!(bot = %self.key, "Long polling stopped");
    }

    fn query(&self, marker: Option<i64>) -> UpdatesQuery {
        UpdatesQuery {
            limit: self.options.limit,
            timeout: Some(self.options.request_timeout.as_secs().min(u64::from(u32::MAX)) as u32),
            marker,
            types: self.options.update_types.clone(),
        }
    }

    async fn remove_webhooks(&self) -> ApiResult<()> {
        for subscription in self.client.subscriptions().await? {
            debug!(bot = %self.key, url = %subscription.url, "Removing webhook subscription");
            self.client.unsubscribe(&subscription.url).await?;
        }
        Ok(())
    }

    /// Runs the handler, keeping the loop alive if it panics.
    async fn dispatch(&self, update: Update) {
        let update_type = update.update_type();
        match AssertUnwindSafe(self.handler.on_update(update))
            .catch_unwind()
            .await
        {
            Ok(Some(_)) => {
                trace!(bot = %self.key, update_type, "Discarding handler response");
            }
            Ok(None) => {}
            Err(_) => {
                error!(bot = %self.key, update_type, "Update handler panicked");
            }
        }
    }
}

/// A bot that polls the platform for updates.
///
/// `start` spawns the polling task; `stop` cancels it and waits for it to
/// finish. Both return `false` when there is nothing to do.
pub struct LongPollingBot<H> {
    poller: Arc<Poller<H>>,
    lifecycle: Lifecycle,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl<H: UpdateHandler> LongPollingBot<H> {
    /// Creates a bot with default options.
    pub fn new(key: impl Into<String>, client: BoxedClient, handler: H) -> Self {
        Self::with_options(key, client, handler, LongPollingBotOptions::default())
    }

    /// Creates a bot with custom options.
    pub fn with_options(
        key: impl Into<String>,
        client: BoxedClient,
        handler: H,
        options: LongPollingBotOptions,
    ) -> Self {
        Self {
            poller: Arc::new(Poller {
                key: key.into(),
                client,
                options,
                handler,
            }),
            lifecycle: Lifecycle::new(),
            task: Mutex::new(None),
        }
    }

    /// Returns the options.
    pub fn options(&self) -> &LongPollingBotOptions {
        &self.poller.options
    }

    /// Returns the handler.
    pub fn handler(&self) -> &H {
        &self.poller.handler
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}

#[async_trait]
impl<H: UpdateHandler> Bot for LongPollingBot<H> {
    fn key(&self) -> &str {
        &self.poller.key
    }

    async fn on_update(&self, update: Update) -> Option<Value> {
        self.poller.handler.on_update(update).await
    }

    async fn start(&self, _container: &dyn BotContainer) -> BotResult<bool> {
        // The task slot is locked across the transition so a concurrent stop
        // always finds the task it has to cancel.
        let mut task = self.task.lock();
        if self.lifecycle.begin_start().is_none() {
            return Ok(false);
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(&self.poller).run(token.clone()));
        *task = Some((token, handle));
        Ok(true)
    }

    async fn stop(&self, _container: &dyn BotContainer) -> BotResult<bool> {
        let task = {
            let mut task = self.task.lock();
            if !self.lifecycle.begin_stop() {
                return Ok(false);
            }
            task.take()
        };

        if let Some((token, handle)) = task {
            token.cancel();
            if let Err(e) = handle.await {
                warn!(bot = %self.poller.key, error = %e, "Polling task ended abnormally");
            }
        }
        Ok(true)
    }
}

impl<H> Drop for LongPollingBot<H> {
    fn drop(&mut self) {
        if let Some((token, _)) = self.task.get_mut().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WebhookBotContainer;
    use crate::testing::MockClient;
    use maxbot_core::{
        ApiError, Message, NewMessageBody, PlatformClient, Subscription, UpdateList, update_fn,
    };
    use parking_lot::Mutex as SyncMutex;

    fn created(chat_id: i64, text: &str) -> Update {
        Update::MessageCreated {
            timestamp: 1,
            message: Message::with_text(chat_id, text),
            user_locale: None,
        }
    }

    fn fast_options() -> LongPollingBotOptions {
        LongPollingBotOptions {
            request_timeout: Duration::from_secs(5),
            error_pause: Duration::from_millis(10),
            remove_webhook: false,
            ..Default::default()
        }
    }

    fn recording_handler() -> (Arc<SyncMutex<Vec<String>>>, impl UpdateHandler) {
        let seen = Arc::new(SyncMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = update_fn(move |update: Update| {
            let sink = Arc::clone(&sink);
            async move {
                if let Some(text) = update.message().and_then(|m| m.text()) {
                    sink.lock().push(text.to_string());
                }
                None
            }
        });
        (seen, handler)
    }

    #[tokio::test]
    async fn test_updates_are_delivered_in_order_with_marker() {
        let client = Arc::new(MockClient::default());
        client.push_poll(Ok(UpdateList {
            updates: vec![created(1, "one"), created(1, "two")],
            marker: Some(5),
        }));
        client.push_poll(Ok(UpdateList {
            updates: vec![created(1, "three")],
            marker: Some(6),
        }));

        let (seen, handler) = recording_handler();
        let bot = LongPollingBot::with_options("poller", client.clone(), handler, fast_options());
        let container = WebhookBotContainer::new();

        assert!(bot.start(&container).await.unwrap());
        client.wait_for_queries(3).await;
        assert!(bot.stop(&container).await.unwrap());

        assert_eq!(*seen.lock(), vec!["one", "two", "three"]);
        let markers: Vec<_> = client.queries().iter().map(|q| q.marker).collect();
        assert_eq!(&markers[..3], &[None, Some(5), Some(6)]);
        assert_eq!(client.queries()[0].timeout, Some(5));
    }

    #[tokio::test]
    async fn test_errors_pause_and_continue() {
        let client = Arc::new(MockClient::default());
        client.push_poll(Err(ApiError::Http("connection reset".into())));
        client.push_poll(Ok(UpdateList {
            updates: vec![created(2, "after error")],
            marker: Some(1),
        }));

        let (seen, handler) = recording_handler();
        let bot = LongPollingBot::with_options("poller", client.clone(), handler, fast_options());
        let container = WebhookBotContainer::new();

        bot.start(&container).await.unwrap();
        client.wait_for_queries(3).await;
        bot.stop(&container).await.unwrap();

        assert_eq!(*seen.lock(), vec!["after error"]);
        // The failed request does not advance the marker.
        assert_eq!(client.queries()[1].marker, None);
    }

    #[tokio::test]
    async fn test_remove_webhook_before_polling() {
        let client = Arc::new(MockClient::default());
        client.set_subscriptions(vec![Subscription {
            url: "https://old.example.com/hook".into(),
            time: 0,
            update_types: None,
        }]);

        let options = LongPollingBotOptions {
            remove_webhook: true,
            ..fast_options()
        };
        let bot = LongPollingBot::with_options(
            "poller",
            client.clone(),
            update_fn(|_| async { None }),
            options,
        );
        let container = WebhookBotContainer::new();

        bot.start(&container).await.unwrap();
        client.wait_for_queries(1).await;
        bot.stop(&container).await.unwrap();

        assert_eq!(
            client.unsubscribed(),
            vec!["https://old.example.com/hook".to_string()]
        );
    }

    #[tokio::test]
    async fn test_start_stop_are_idempotent() {
        let client = Arc::new(MockClient::default());
        let bot = LongPollingBot::with_options(
            "poller",
            client.clone(),
            update_fn(|_| async { None }),
            fast_options(),
        );
        let container = WebhookBotContainer::new();

        assert!(!bot.stop(&container).await.unwrap());
        assert!(bot.start(&container).await.unwrap());
        assert!(!bot.start(&container).await.unwrap());
        assert!(bot.stop(&container).await.unwrap());
        assert!(!bot.stop(&container).await.unwrap());
        assert_eq!(bot.state(), LifecycleState::Stopped);

        // Restart after stop.
        assert!(bot.start(&container).await.unwrap());
        assert!(bot.stop(&container).await.unwrap());
    }

    #[tokio::test]
    async fn test_handler_panic_keeps_polling() {
        let client = Arc::new(MockClient::default());
        client.push_poll(Ok(UpdateList {
            updates: vec![created(3, "boom"), created(3, "fine")],
            marker: Some(2),
        }));

        let replier = Arc::clone(&client);
        let handler = update_fn(move |update: Update| {
            let client = Arc::clone(&replier);
            async move {
                let message = update.message().cloned().expect("message update");
                let text = message.text().unwrap_or_default().to_string();
                if text == "boom" {
                    panic!("handler exploded");
                }
                let chat_id = message.chat_id().expect("chat id");
                let _ = client.send_message(chat_id, &NewMessageBody::text(text)).await;
                None
            }
        });
        let bot = LongPollingBot::with_options("poller", client.clone(), handler, fast_options());
        let container = WebhookBotContainer::new();

        bot.start(&container).await.unwrap();
        client.wait_for_queries(2).await;
        bot.stop(&container).await.unwrap();

        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 3);
        assert_eq!(sent[0].1.text.as_deref(), Some("fine"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_start_stop_never_orphans_task() {
        let container = Arc::new(WebhookBotContainer::new());

        for _ in 0..200 {
            let client = Arc::new(MockClient::default());
            let bot = Arc::new(LongPollingBot::with_options(
                "poller",
                client,
                update_fn(|_| async { None }),
                fast_options(),
            ));

            let starter = {
                let (bot, container) = (Arc::clone(&bot), Arc::clone(&container));
                tokio::spawn(async move { bot.start(&*container).await.unwrap() })
            };
            let stopper = {
                let (bot, container) = (Arc::clone(&bot), Arc::clone(&container));
                tokio::spawn(async move { bot.stop(&*container).await.unwrap() })
            };
            starter.await.unwrap();
            stopper.await.unwrap();

            let running = bot.task.lock().is_some();
            assert_eq!(running, bot.state() == LifecycleState::Started);
            bot.stop(&*container).await.unwrap();
            assert!(bot.task.lock().is_none());
        }
    }

    #[test]
    fn test_options_from_config() {
        let config = LongPollingConfig {
            request_timeout_secs: 45,
            limit: Some(10),
            error_pause_ms: 250,
            ..Default::default()
        };
        let options = LongPollingBotOptions::from(&config);
        assert_eq!(options.request_timeout, Duration::from_secs(45));
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.error_pause, Duration::from_millis(250));
        assert!(options.remove_webhook);
    }
}
