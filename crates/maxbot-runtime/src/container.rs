//! Webhook bot container: registry and request router.
//!
//! The container owns the set of registered bots, keyed by a path derived
//! from each bot's key (`"/" + key`). The HTTP layer hands every request to
//! [`handle_request`](WebhookHandler::handle_request), which finds the bot,
//! parses the payload with the bot's serializer, calls
//! [`Bot::on_update`], and serializes the answer.
//!
//! # Guarantees
//!
//! - At most one bot per path, and a bot is registered under at most one
//!   path. `register` is a single insert-if-absent under the write lock.
//! - `unregister` only succeeds for the exact instance that was registered.
//! - No lock is held across an `.await`; bots are cloned out of the map first.
//! - [`start`](WebhookBotContainer::start) and
//!   [`stop`](WebhookBotContainer::stop) run over a snapshot, and a failing or
//!   panicking hook is logged without affecting the other bots.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use maxbot_core::{
    Bot, BotContainer, BoxedBot, WebhookError, WebhookHandler, WebhookResult,
};
use parking_lot::RwLock;
use tracing::{debug, error, info, trace};

use crate::config::WebhookConfig;
use crate::error::{RegistryError, RegistryResult};

/// Instance identity of a registered bot (its data pointer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BotIdentity(usize);

impl BotIdentity {
    fn of(bot: &BoxedBot) -> Self {
        Self(Arc::as_ptr(bot).cast::<()>() as usize)
    }
}

#[derive(Default)]
struct Routes {
    by_path: HashMap<String, BoxedBot>,
    by_bot: HashMap<BotIdentity, String>,
}

/// Lifecycle hook run by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    Start,
    Stop,
}

/// Outcome of running a lifecycle hook over a set of bots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookReport {
    /// Hooks that returned `true`.
    pub changed: usize,
    /// Hooks that returned `false`.
    pub skipped: usize,
    /// Hooks that returned an error or panicked.
    pub failed: usize,
}

/// Registry and router for webhook bots.
pub struct WebhookBotContainer {
    routes: RwLock<Routes>,
    path_prefix: String,
    public_url: Option<String>,
}

impl WebhookBotContainer {
    /// Creates an empty container mounted at the root, without a public URL.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(Routes::default()),
            path_prefix: String::new(),
            public_url: None,
        }
    }

    /// Creates an empty container from the webhook configuration.
    pub fn from_config(config: &WebhookConfig) -> Self {
        let container = Self::new().with_path_prefix(&config.path_prefix);
        match &config.public_url {
            Some(url) => container.with_public_url(url),
            None => container,
        }
    }

    /// Sets the mount point used to build webhook URLs.
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = prefix.trim().trim_end_matches('/').to_string();
        self
    }

    /// Sets the externally reachable base URL.
    pub fn with_public_url(mut self, url: &str) -> Self {
        self.public_url = Some(url.trim().trim_end_matches('/').to_string());
        self
    }

    /// Returns the mount point.
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Registers a bot under `"/" + key`. Returns the path.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the path is taken;
    /// the existing registration is left untouched.
    pub fn register(&self, bot: BoxedBot) -> RegistryResult<String> {
        let path = derive_path(bot.key());
        let identity = BotIdentity::of(&bot);

        let mut routes = self.routes.write();
        match routes.by_path.entry(path.clone()) {
            Entry::Occupied(_) => {
                debug!(path = %path, "Path already taken");
                Err(RegistryError::already_registered(path))
            }
            Entry::Vacant(entry) => {
                entry.insert(bot);
                routes.by_bot.insert(identity, path.clone());
                info!(path = %path, "Registered webhook bot");
                Ok(path)
            }
        }
    }

    /// Removes a bot's registration.
    ///
    /// Fails with [`RegistryError::NotRegistered`] unless `bot` is the very
    /// instance currently registered under its path.
    pub fn unregister(&self, bot: &BoxedBot) -> RegistryResult<()> {
        let identity = BotIdentity::of(bot);

        let mut routes = self.routes.write();
        let Some(path) = routes.by_bot.get(&identity).cloned() else {
            return Err(RegistryError::not_registered(bot.key()));
        };

        let same_instance = routes
            .by_path
            .get(&path)
            .is_some_and(|current| BotIdentity::of(current) == identity);
        if !same_instance {
            return Err(RegistryError::not_registered(bot.key()));
        }

        routes.by_path.remove(&path);
        routes.by_bot.remove(&identity);
        info!(path = %path, "Unregistered webhook bot");
        Ok(())
    }

    /// Returns a snapshot of the registered bots.
    pub fn list_bots(&self) -> Vec<BoxedBot> {
        self.routes.read().by_path.values().cloned().collect()
    }

    /// Returns the bot registered under `path`.
    pub fn get(&self, path: &str) -> Option<BoxedBot> {
        self.routes.read().by_path.get(path).cloned()
    }

    /// Returns the number of registered bots.
    pub fn len(&self) -> usize {
        self.routes.read().by_path.len()
    }

    /// Returns whether no bot is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every registered bot's start hook.
    pub async fn start(&self) -> HookReport {
        run_hooks(&self.list_bots(), self, Hook::Start).await
    }

    /// Runs every registered bot's stop hook.
    pub async fn stop(&self) -> HookReport {
        run_hooks(&self.list_bots(), self, Hook::Stop).await
    }
}

impl Default for WebhookBotContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WebhookBotContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<String> = self.routes.read().by_path.keys().cloned().collect();
        paths.sort_unstable();
        f.debug_struct("WebhookBotContainer")
            .field("path_prefix", &self.path_prefix)
            .field("public_url", &self.public_url)
            .field("paths", &paths)
            .finish()
    }
}

impl BotContainer for WebhookBotContainer {
    fn path(&self, key: &str) -> String {
        derive_path(key)
    }

    fn webhook_url(&self, key: &str) -> Option<String> {
        let base = self.public_url.as_deref()?;
        Some(format!("{base}{}{}", self.path_prefix, derive_path(key)))
    }
}

#[async_trait]
impl WebhookHandler for WebhookBotContainer {
    async fn handle_request(&self, path: &str, method: &str, body: &[u8]) -> WebhookResult<String> {
        if method != "POST" {
            return Ok("OK".to_string());
        }

        let bot = self
            .get(path)
            .ok_or_else(|| WebhookError::bot_not_found(path))?;

        let update = bot.serializer().deserialize(body)?;
        trace!(path = %path, update_type = update.update_type(), "Dispatching update");

        match bot.on_update(update).await {
            Some(response) => Ok(bot.serializer().serialize(&response)?),
            None => Ok(String::new()),
        }
    }
}

fn derive_path(key: &str) -> String {
    format!("/{key}")
}

/// Runs `hook` for each bot in order, isolating failures.
pub(crate) async fn run_hooks(
    bots: &[BoxedBot],
    container: &dyn BotContainer,
    hook: Hook,
) -> HookReport {
    let mut report = HookReport::default();

    for bot in bots {
        let key = bot.key();
        let outcome = match hook {
            Hook::Start => AssertUnwindSafe(bot.start(container)).catch_unwind().await,
            Hook::Stop => AssertUnwindSafe(bot.stop(container)).catch_unwind().await,
        };

        match outcome {
            Ok(Ok(true)) => {
                report.changed += 1;
                info!(bot = %key, hook = ?hook, "Bot lifecycle hook completed");
            }
            Ok(Ok(false)) => {
                report.skipped += 1;
                debug!(bot = %key, hook = ?hook, "Bot lifecycle hook not applicable");
            }
            Ok(Err(e)) => {
                report.failed += 1;
                error!(bot = %key, hook = ?hook, error = %e, "Bot lifecycle hook failed");
            }
            Err(panic) => {
                report.failed += 1;
                error!(
                    bot = %key,
                    hook = ?hook,
                    panic = %panic_message(panic.as_ref()),
                    "Bot lifecycle hook panicked"
                );
            }
        }
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxbot_core::{
        BotError, BotResult, JsonSerializer, SerializationError, SerializationResult, Serializer,
        Update,
    };
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum StartBehavior {
        Succeed,
        Skip,
        Fail,
        Panic,
    }

    struct MockBot {
        key: String,
        behavior: StartBehavior,
        response: Option<Value>,
        refuse_responses: bool,
        started: AtomicUsize,
        stopped: AtomicUsize,
        updates: AtomicUsize,
    }

    /// Reads JSON but cannot write any response.
    struct ReadOnlySerializer;

    impl Serializer for ReadOnlySerializer {
        fn deserialize(&self, body: &[u8]) -> SerializationResult<Update> {
            JsonSerializer.deserialize(body)
        }

        fn serialize(&self, _value: &Value) -> SerializationResult<String> {
            Err(SerializationError::Serialize("read-only format".into()))
        }
    }

    impl MockBot {
        fn new(key: &str) -> Self {
            Self::with_behavior(key, StartBehavior::Succeed)
        }

        fn with_behavior(key: &str, behavior: StartBehavior) -> Self {
            Self {
                key: key.to_string(),
                behavior,
                response: None,
                refuse_responses: false,
                started: AtomicUsize::new(0),
                stopped: AtomicUsize::new(0),
                updates: AtomicUsize::new(0),
            }
        }

        fn responding(mut self, response: Value) -> Self {
            self.response = Some(response);
            self
        }

        fn read_only(mut self) -> Self {
            self.refuse_responses = true;
            self
        }
    }

    #[async_trait]
    impl Bot for MockBot {
        fn key(&self) -> &str {
            &self.key
        }

        fn serializer(&self) -> &dyn Serializer {
            if self.refuse_responses {
                &ReadOnlySerializer
            } else {
                &JsonSerializer
            }
        }

        async fn on_update(&self, _update: Update) -> Option<Value> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }

        async fn start(&self, _container: &dyn BotContainer) -> BotResult<bool> {
            match self.behavior {
                StartBehavior::Succeed => {
                    self.started.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                }
                StartBehavior::Skip => Ok(false),
                StartBehavior::Fail => Err(BotError::internal("subscription refused")),
                StartBehavior::Panic => panic!("start exploded"),
            }
        }

        async fn stop(&self, _container: &dyn BotContainer) -> BotResult<bool> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn boxed(bot: MockBot) -> (Arc<MockBot>, BoxedBot) {
        let bot = Arc::new(bot);
        let boxed: BoxedBot = bot.clone();
        (bot, boxed)
    }

    const CREATED: &[u8] = br#"{
        "update_type": "message_created",
        "timestamp": 1,
        "message": {
            "recipient": {"chat_id": 10, "chat_type": "dialog"},
            "timestamp": 1,
            "body": {"mid": "m1", "seq": 1, "text": "/help"}
        }
    }"#;

    #[test]
    fn test_register_distinct_keys() {
        let container = WebhookBotContainer::new();
        let (_, a) = boxed(MockBot::new("a"));
        let (_, b) = boxed(MockBot::new("b"));

        assert_eq!(container.register(a).unwrap(), "/a");
        assert_eq!(container.register(b).unwrap(), "/b");
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_duplicate_key_keeps_original() {
        let container = WebhookBotContainer::new();
        let (_, first) = boxed(MockBot::new("echo"));
        let (_, second) = boxed(MockBot::new("echo"));

        container.register(first.clone()).unwrap();
        let err = container.register(second).unwrap_err();
        assert_eq!(err, RegistryError::already_registered("/echo"));

        let current = container.get("/echo").unwrap();
        assert_eq!(BotIdentity::of(&current), BotIdentity::of(&first));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_same_instance_twice_is_rejected() {
        let container = WebhookBotContainer::new();
        let (_, bot) = boxed(MockBot::new("echo"));

        container.register(bot.clone()).unwrap();
        assert!(matches!(
            container.register(bot),
            Err(RegistryError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_unregister_unknown() {
        let container = WebhookBotContainer::new();
        let (_, bot) = boxed(MockBot::new("ghost"));

        assert_eq!(
            container.unregister(&bot),
            Err(RegistryError::not_registered("ghost"))
        );
    }

    #[test]
    fn test_register_unregister_unregister() {
        let container = WebhookBotContainer::new();
        let (_, bot) = boxed(MockBot::new("echo"));

        container.register(bot.clone()).unwrap();
        assert_eq!(container.unregister(&bot), Ok(()));
        assert!(matches!(
            container.unregister(&bot),
            Err(RegistryError::NotRegistered { .. })
        ));
        assert!(container.is_empty());
        assert!(container.get("/echo").is_none());
    }

    #[test]
    fn test_unregister_other_instance_with_same_key() {
        let container = WebhookBotContainer::new();
        let (_, registered) = boxed(MockBot::new("echo"));
        let (_, impostor) = boxed(MockBot::new("echo"));

        container.register(registered.clone()).unwrap();
        assert!(matches!(
            container.unregister(&impostor),
            Err(RegistryError::NotRegistered { .. })
        ));
        assert!(container.get("/echo").is_some());
    }

    #[test]
    fn test_reregister_after_unregister() {
        let container = WebhookBotContainer::new();
        let (_, first) = boxed(MockBot::new("echo"));
        let (_, second) = boxed(MockBot::new("echo"));

        container.register(first.clone()).unwrap();
        container.unregister(&first).unwrap();
        container.register(second.clone()).unwrap();

        let current = container.get("/echo").unwrap();
        assert_eq!(BotIdentity::of(&current), BotIdentity::of(&second));
    }

    #[test]
    fn test_webhook_url() {
        let container = WebhookBotContainer::new();
        assert_eq!(container.path("echo"), "/echo");
        assert_eq!(container.webhook_url("echo"), None);

        let container = WebhookBotContainer::new()
            .with_path_prefix("/webhook/")
            .with_public_url("https://bots.example.com/");
        assert_eq!(
            container.webhook_url("echo").as_deref(),
            Some("https://bots.example.com/webhook/echo")
        );
    }

    #[test]
    fn test_from_config() {
        let config = WebhookConfig {
            public_url: Some("https://example.com".into()),
            ..Default::default()
        };
        let container = WebhookBotContainer::from_config(&config);
        assert_eq!(container.path_prefix(), "/webhook");
        assert_eq!(
            container.webhook_url("bot").as_deref(),
            Some("https://example.com/webhook/bot")
        );
    }

    #[tokio::test]
    async fn test_non_post_returns_ok() {
        let container = WebhookBotContainer::new();
        let (mock, bot) = boxed(MockBot::new("echo"));
        container.register(bot).unwrap();

        for (path, method, body) in [
            ("/echo", "GET", &b""[..]),
            ("/missing", "PUT", &b"garbage"[..]),
            ("/", "HEAD", &b"{}"[..]),
        ] {
            assert_eq!(
                container.handle_request(path, method, body).await.unwrap(),
                "OK"
            );
        }
        assert_eq!(mock.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_unknown_path() {
        let container = WebhookBotContainer::new();
        let err = container
            .handle_request("/nobody", "POST", CREATED)
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::BotNotFound { ref path } if path == "/nobody"));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_bad_body_never_reaches_bot() {
        let container = WebhookBotContainer::new();
        let (mock, bot) = boxed(MockBot::new("echo"));
        container.register(bot).unwrap();

        let err = container
            .handle_request("/echo", "POST", b"{not json")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WebhookError::Serialization(SerializationError::Deserialize(_))
        ));
        assert_eq!(err.status_code(), 500);
        assert_eq!(mock.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_dispatches_update() {
        let container = WebhookBotContainer::new();
        let (silent, bot) = boxed(MockBot::new("silent"));
        let (_, replying) = boxed(MockBot::new("reply").responding(json!({"ok": true})));
        container.register(bot).unwrap();
        container.register(replying).unwrap();

        let body = container
            .handle_request("/silent", "POST", CREATED)
            .await
            .unwrap();
        assert_eq!(body, "");
        assert_eq!(silent.updates.load(Ordering::SeqCst), 1);

        let body = container
            .handle_request("/reply", "POST", CREATED)
            .await
            .unwrap();
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_response_uses_bot_serializer() {
        let container = WebhookBotContainer::new();
        let (mock, bot) = boxed(
            MockBot::new("strict")
                .responding(json!({"ok": true}))
                .read_only(),
        );
        container.register(bot).unwrap();

        let err = container
            .handle_request("/strict", "POST", CREATED)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WebhookError::Serialization(SerializationError::Serialize(_))
        ));
        assert_eq!(err.status_code(), 500);
        assert_eq!(mock.updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_response_skips_serializer() {
        let container = WebhookBotContainer::new();
        let (mock, bot) = boxed(MockBot::new("strict").read_only());
        container.register(bot).unwrap();

        let body = container
            .handle_request("/strict", "POST", CREATED)
            .await
            .unwrap();
        assert_eq!(body, "");
        assert_eq!(mock.updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_isolates_failures() {
        let container = WebhookBotContainer::new();
        let (a, a_boxed) = boxed(MockBot::new("a"));
        let (_, b_boxed) = boxed(MockBot::with_behavior("b", StartBehavior::Fail));
        let (c, c_boxed) = boxed(MockBot::new("c"));
        container.register(a_boxed).unwrap();
        container.register(b_boxed).unwrap();
        container.register(c_boxed).unwrap();

        let report = container.start().await;
        assert_eq!(report.changed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(a.started.load(Ordering::SeqCst), 1);
        assert_eq!(c.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_survives_panic_and_skips() {
        let container = WebhookBotContainer::new();
        let (ok, ok_boxed) = boxed(MockBot::new("ok"));
        let (_, panicking) = boxed(MockBot::with_behavior("boom", StartBehavior::Panic));
        let (_, skipping) = boxed(MockBot::with_behavior("idle", StartBehavior::Skip));
        container.register(ok_boxed).unwrap();
        container.register(panicking).unwrap();
        container.register(skipping).unwrap();

        let report = container.start().await;
        assert_eq!(
            report,
            HookReport {
                changed: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(ok.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_runs_every_hook() {
        let container = WebhookBotContainer::new();
        let (a, a_boxed) = boxed(MockBot::new("a"));
        let (b, b_boxed) = boxed(MockBot::new("b"));
        container.register(a_boxed).unwrap();
        container.register(b_boxed).unwrap();

        let report = container.stop().await;
        assert_eq!(report.changed, 2);
        assert_eq!(a.stopped.load(Ordering::SeqCst), 1);
        assert_eq!(b.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_single_winner() {
        let container = Arc::new(WebhookBotContainer::new());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let container = Arc::clone(&container);
                tokio::spawn(async move {
                    let (_, bot) = boxed(MockBot::new("race"));
                    container.register(bot).is_ok()
                })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic>");
    }
}
