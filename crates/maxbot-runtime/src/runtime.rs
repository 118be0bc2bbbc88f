//! Runtime orchestration.
//!
//! [`BotRuntime`] ties the pieces together: it loads configuration,
//! initializes logging, owns the [`WebhookBotContainer`] and the webhook
//! server, and drives long-polling bots.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use maxbot_runtime::{BotRuntime, WebhookBot};
//!
//! let runtime = BotRuntime::new();
//! let client = runtime.default_api_client()?;
//!
//! runtime.register_webhook_bot(WebhookBot::new("echo", client, chat))?;
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use maxbot_core::{Bot, BoxedBot, BoxedClient};
use maxbot_transport::{HttpApiClient, ListenerHandle, WebhookServer};
use parking_lot::{Mutex, RwLock};
use tokio::signal;
use tracing::{info, warn};

use crate::config::{ConfigError, ConfigLoader, ConfigResult, MaxbotConfig, validate_config};
use crate::container::{Hook, HookReport, WebhookBotContainer, run_hooks};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::longpolling::LongPollingBotOptions;
use crate::webhook::WebhookBotOptions;

/// The main runtime.
pub struct BotRuntime {
    config: MaxbotConfig,
    container: Arc<WebhookBotContainer>,
    polling_bots: RwLock<Vec<BoxedBot>>,
    listener: Mutex<Option<ListenerHandle>>,
    running: AtomicBool,
}

impl BotRuntime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// Falls back to defaults if no configuration can be loaded.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                MaxbotConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging.
    pub fn from_config(config: &MaxbotConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            webhook_addr = %config.webhook.bind_addr(),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            container: Arc::new(WebhookBotContainer::from_config(&config.webhook)),
            polling_bots: RwLock::new(Vec::new()),
            listener: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MaxbotConfig {
        &self.config
    }

    /// Returns the webhook bot container.
    pub fn container(&self) -> &Arc<WebhookBotContainer> {
        &self.container
    }

    /// Returns whether the runtime is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns the bound webhook server address while it is running.
    pub fn webhook_addr(&self) -> Option<std::net::SocketAddr> {
        self.listener.lock().as_ref().map(ListenerHandle::local_addr)
    }

    /// Builds a platform API client for `token` from the `api` settings.
    pub fn api_client(&self, token: impl Into<String>) -> RuntimeResult<BoxedClient> {
        let client = HttpApiClient::with_options(
            token,
            self.config.api.base_url.as_str(),
            self.config.api.timeout(),
        )?;
        Ok(Arc::new(client))
    }

    /// Builds a platform API client with the configured `api.access_token`.
    pub fn default_api_client(&self) -> RuntimeResult<BoxedClient> {
        let token = self
            .config
            .api
            .access_token
            .clone()
            .ok_or_else(|| ConfigError::validation("api.access_token is not set"))?;
        self.api_client(token)
    }

    /// Webhook bot options from the `webhook` settings.
    pub fn webhook_bot_options(&self) -> WebhookBotOptions {
        WebhookBotOptions::from(&self.config.webhook)
    }

    /// Long-polling options from the `long_polling` settings.
    pub fn long_polling_options(&self) -> LongPollingBotOptions {
        LongPollingBotOptions::from(&self.config.long_polling)
    }

    /// Registers a bot with the webhook container. Returns its path.
    pub fn register_webhook_bot<B: Bot>(&self, bot: B) -> RuntimeResult<String> {
        Ok(self.container.register(Arc::new(bot))?)
    }

    /// Registers an already shared bot. Keep the `Arc` to unregister later.
    pub fn register_shared_webhook_bot(&self, bot: BoxedBot) -> RuntimeResult<String> {
        Ok(self.container.register(bot)?)
    }

    /// Removes a bot from the webhook container.
    pub fn unregister_webhook_bot(&self, bot: &BoxedBot) -> RuntimeResult<()> {
        Ok(self.container.unregister(bot)?)
    }

    /// Adds a bot that is started and stopped with the runtime.
    pub fn add_long_polling_bot<B: Bot>(&self, bot: B) {
        info!(bot = %bot.key(), "Added long-polling bot");
        self.polling_bots.write().push(Arc::new(bot));
    }

    /// Starts the webhook server (when any webhook bot is registered), the
    /// webhook bots, then the long-polling bots.
    pub async fn start(&self) -> RuntimeResult<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("Runtime is already running");
            return Ok(());
        }

        info!("Starting maxbot runtime");

        if !self.container.is_empty() {
            let handler = Arc::clone(&self.container);
            let listener = WebhookServer::listen(
                &self.config.webhook.bind_addr(),
                &self.config.webhook.path_prefix,
                handler,
            )
            .await;

            match listener {
                Ok(handle) => *self.listener.lock() = Some(handle),
                Err(e) => {
                    self.running.store(false, Ordering::Release);
                    return Err(e.into());
                }
            }
        }

        let webhook = self.container.start().await;
        let polling = self.run_polling_hooks(Hook::Start).await;

        info!(
            webhook_started = webhook.changed,
            polling_started = polling.changed,
            failed = webhook.failed + polling.failed,
            "Runtime started"
        );

        Ok(())
    }

    /// Stops bots in reverse order, then the webhook server.
    pub async fn stop(&self) -> RuntimeResult<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            warn!("Runtime is not running");
            return Ok(());
        }

        info!("Stopping maxbot runtime");

        self.run_polling_hooks(Hook::Stop).await;
        self.container.stop().await;

        let listener = self.listener.lock().take();
        if let Some(handle) = listener {
            handle.shutdown().await;
        }

        info!("Runtime stopped");
        Ok(())
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("maxbot runtime is now running. Press Ctrl+C to stop.");

        let waited = wait_for_shutdown().await;
        self.stop().await?;
        waited
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }

    async fn run_polling_hooks(&self, hook: Hook) -> HookReport {
        let bots = self.polling_bots.read().clone();
        run_hooks(&bots, &*self.container, hook).await
    }
}

impl Default for BotRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(RuntimeError::Signal)?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.map_err(RuntimeError::Signal)?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map_err(RuntimeError::Signal)?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`BotRuntime`] with custom configuration sources.
///
/// ```rust,ignore
/// let runtime = BotRuntime::builder()
///     .config_file("config/maxbot.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically.
    pub fn merge(mut self, config: MaxbotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads and validates the configuration, then builds the runtime.
    pub fn build(self) -> ConfigResult<BotRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;
        Ok(BotRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
