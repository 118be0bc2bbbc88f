//! Echo Bot Demo
//!
//! A small chat bot on top of the maxbot framework. It runs either as a
//! webhook bot behind the built-in HTTP server or as a long-polling bot.
//!
//! # Commands
//!
//! ```text
//! /echo <text>           - Echo text
//! /repeat -t <n> <text>  - Echo text n times
//! /info                  - Message info
//! /help                  - This help
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Long polling
//! cargo run --package echo-bot -- --token <TOKEN>
//!
//! # Webhook, reachable from the platform at https://bots.example.com/webhook/echo
//! cargo run --package echo-bot -- --token <TOKEN> --mode webhook \
//!     --public-url https://bots.example.com
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use maxbot::prelude::*;
use maxbot::runtime::config::{ConfigLoader, validate_config};

const HELP_TEXT: &str = "Echo Bot - Commands\n\
    /echo <text> - Echo text\n\
    /repeat -t <n> <text> - Echo text n times\n\
    /info - Message info\n\
    /help - This help";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Webhook,
    Polling,
}

#[derive(Debug, Parser)]
#[command(name = "echo-bot", about = "Echo bot for the Max messaging platform")]
struct Cli {
    /// Bot access token; falls back to `api.access_token`.
    #[arg(long)]
    token: Option<String>,

    /// How updates are delivered.
    #[arg(long, value_enum, default_value_t = Mode::Polling)]
    mode: Mode,

    /// Configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Webhook bind host.
    #[arg(long)]
    host: Option<String>,

    /// Webhook bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Public base URL the platform can reach.
    #[arg(long)]
    public_url: Option<String>,
}

/// Arguments of `/repeat`.
#[derive(Debug, Parser)]
struct RepeatArgs {
    /// How many times to repeat.
    #[arg(short, long, default_value_t = 1)]
    times: u8,

    /// Text to repeat.
    #[arg(required = true)]
    text: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Sends `text` back to the chat the message came from.
async fn reply(client: &BoxedClient, message: &Message, text: &str) {
    let Some(chat_id) = message.chat_id() else {
        warn!("Message has no chat, dropping reply");
        return;
    };

    if let Err(e) = client.send_message(chat_id, &NewMessageBody::text(text)).await {
        error!(chat_id, error = %e, "Failed to send reply");
    }
}

/// `/echo <text>`
struct Echo {
    client: BoxedClient,
}

#[async_trait]
impl CommandHandler for Echo {
    async fn execute(&self, message: &Message, command: &CommandLine) {
        if command.has_args() {
            reply(&self.client, message, &command.joined_args()).await;
        } else {
            reply(&self.client, message, "Usage: /echo <text>").await;
        }
    }
}

impl Command for Echo {
    fn key(&self) -> &str {
        "echo"
    }
}

fn build_chat(client: &BoxedClient) -> ChatBot {
    let repeat = Arc::clone(client);
    let info = Arc::clone(client);
    let help = Arc::clone(client);
    let unknown = Arc::clone(client);
    let fallback = Arc::clone(client);

    ChatBot::builder()
        .add(Echo {
            client: Arc::clone(client),
        })
        .on(
            "repeat",
            handler_fn(move |message: Message, command: CommandLine| {
                let client = Arc::clone(&repeat);
                async move {
                    let text = match command.parse_args::<RepeatArgs>() {
                        Ok(args) => {
                            let line = args.text.join(" ");
                            vec![line; usize::from(args.times)].join("\n")
                        }
                        Err(e) => e.to_string(),
                    };
                    reply(&client, &message, &text).await;
                }
            }),
        )
        .on(
            "info",
            handler_fn(move |message: Message, _command: CommandLine| {
                let client = Arc::clone(&info);
                async move {
                    let from = message
                        .sender
                        .as_ref()
                        .map(|user| format!("{} ({})", user.first_name, user.user_id))
                        .unwrap_or_else(|| "unknown".to_string());
                    let text = format!(
                        "Message Info\n\
                        • From: {from}\n\
                        • Chat: {:?}\n\
                        • Message ID: {}",
                        message.chat_id(),
                        message.body.mid
                    );
                    reply(&client, &message, &text).await;
                }
            }),
        )
        .on(
            "help",
            handler_fn(move |message: Message, _command: CommandLine| {
                let client = Arc::clone(&help);
                async move { reply(&client, &message, HELP_TEXT).await }
            }),
        )
        .on_unknown_command(handler_fn(move |message: Message, command: CommandLine| {
            let client = Arc::clone(&unknown);
            async move {
                let text = format!("Unknown command /{}. Try /help", command.key());
                reply(&client, &message, &text).await;
            }
        }))
        .by_default(message_fn(move |message: Message| {
            let client = Arc::clone(&fallback);
            async move {
                info!(chat = ?message.chat_id(), text = ?message.text(), "Plain message");
                if let Some(text) = message.text().filter(|text| !text.trim().is_empty()) {
                    let text = text.to_string();
                    reply(&client, &message, &text).await;
                }
            }
        }))
        .build()
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;

    if let Some(token) = cli.token {
        config.api.access_token = Some(token);
    }
    if let Some(host) = cli.host {
        config.webhook.host = host;
    }
    if let Some(port) = cli.port {
        config.webhook.port = port;
    }
    if let Some(url) = cli.public_url {
        config.webhook.public_url = Some(url);
    }
    validate_config(&config)?;

    let runtime = BotRuntime::from_config(&config);
    let client = runtime
        .default_api_client()
        .context("an access token is required (--token or api.access_token)")?;
    let chat = build_chat(&client);

    match cli.mode {
        Mode::Webhook => {
            let bot = WebhookBot::new("echo", client, chat)
                .with_options(runtime.webhook_bot_options());
            let path = runtime.register_webhook_bot(bot)?;
            info!(
                path = %path,
                prefix = %runtime.container().path_prefix(),
                "Serving webhook bot"
            );
        }
        Mode::Polling => {
            runtime.add_long_polling_bot(LongPollingBot::with_options(
                "echo",
                client,
                chat,
                runtime.long_polling_options(),
            ));
        }
    }

    runtime.run().await?;

    Ok(())
}
