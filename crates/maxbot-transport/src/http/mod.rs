//! HTTP transport.
//!
//! This module provides the webhook server and the platform API client.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::{DEFAULT_BASE_URL, HttpApiClient};

#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
pub use server::{ListenerHandle, WebhookServer, webhook_router};
