//! Bot trait and related types.
//!
//! A [`Bot`] is the unit the container routes to: it has a stable key, a
//! start/stop lifecycle driven by its container, and an
//! [`on_update`](Bot::on_update) entry point. The logic behind `on_update` is
//! usually an [`UpdateHandler`], which lets the same handler run behind a
//! webhook or a long-polling loop.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BotResult;
use crate::model::Update;
use crate::serializer::{JsonSerializer, Serializer};

/// The core Bot trait.
///
/// # Lifecycle
///
/// The container calls [`start`](Bot::start) and [`stop`](Bot::stop) for every
/// registered bot. A hook returns `Ok(false)` when there is nothing to do (for
/// example the bot is already started); errors are logged by the container and
/// never stop other bots from starting.
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// Returns the bot's unique, stable key.
    ///
    /// The container derives the webhook path from it, so it must not change
    /// while the bot is registered.
    fn key(&self) -> &str;

    /// Returns the serializer used for this bot's webhook payloads.
    fn serializer(&self) -> &dyn Serializer {
        &JsonSerializer
    }

    /// Handles one update and returns an optional response body.
    async fn on_update(&self, update: Update) -> Option<Value>;

    /// Called when the container starts.
    async fn start(&self, _container: &dyn BotContainer) -> BotResult<bool> {
        Ok(false)
    }

    /// Called when the container stops.
    async fn stop(&self, _container: &dyn BotContainer) -> BotResult<bool> {
        Ok(false)
    }
}

/// A shared Bot trait object.
pub type BoxedBot = Arc<dyn Bot>;

/// The view of a bot container that lifecycle hooks get.
pub trait BotContainer: Send + Sync {
    /// Returns the container path of the bot with `key`, e.g. `/echo`.
    fn path(&self, key: &str) -> String;

    /// Returns the public URL the platform should POST updates to.
    ///
    /// `None` when the container has no public address configured.
    fn webhook_url(&self, key: &str) -> Option<String>;
}

// =============================================================================
// Update Handlers
// =============================================================================

/// The logic a bot delegates its updates to.
#[async_trait]
pub trait UpdateHandler: Send + Sync + 'static {
    /// Handles one update and returns an optional response body.
    async fn on_update(&self, update: Update) -> Option<Value>;
}

#[async_trait]
impl<H: UpdateHandler + ?Sized> UpdateHandler for Arc<H> {
    async fn on_update(&self, update: Update) -> Option<Value> {
        (**self).on_update(update).await
    }
}

/// An [`UpdateHandler`] backed by an async closure.
pub struct UpdateFn<F> {
    f: F,
}

/// Wraps an async closure as an [`UpdateHandler`].
///
/// ```rust,ignore
/// let handler = update_fn(|update: Update| async move {
///     tracing::info!(update_type = update.update_type(), "got update");
///     None
/// });
/// ```
pub fn update_fn<F, Fut>(f: F) -> UpdateFn<F>
where
    F: Fn(Update) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Value>> + Send + 'static,
{
    UpdateFn { f }
}

#[async_trait]
impl<F, Fut> UpdateHandler for UpdateFn<F>
where
    F: Fn(Update) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Value>> + Send + 'static,
{
    async fn on_update(&self, update: Update) -> Option<Value> {
        (self.f)(update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Silent;

    #[async_trait]
    impl Bot for Silent {
        fn key(&self) -> &str {
            "silent"
        }

        async fn on_update(&self, _update: Update) -> Option<Value> {
            None
        }
    }

    struct NoUrl;

    impl BotContainer for NoUrl {
        fn path(&self, key: &str) -> String {
            format!("/{key}")
        }

        fn webhook_url(&self, _key: &str) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn test_default_hooks_are_not_applicable() {
        let bot = Silent;
        assert!(!bot.start(&NoUrl).await.unwrap());
        assert!(!bot.stop(&NoUrl).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_fn() {
        let handler = update_fn(|update: Update| async move {
            Some(json!({ "type": update.update_type() }))
        });

        let shared: Arc<dyn UpdateHandler> = Arc::new(handler);
        let response = shared.on_update(Update::Unknown).await;
        assert_eq!(response, Some(json!({ "type": "unknown" })));
    }
}
