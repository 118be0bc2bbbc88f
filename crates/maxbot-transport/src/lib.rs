//! # maxbot Transport
//!
//! Network implementations of the collaborators defined in `maxbot-core`.
//!
//! ## Features
//!
//! - `http-server` (default): axum webhook server routing requests into a
//!   [`WebhookHandler`](maxbot_core::WebhookHandler)
//! - `http-client` (default): reqwest implementation of
//!   [`PlatformClient`](maxbot_core::PlatformClient)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  maxbot-runtime     │  (bot container, webhook and polling bots)
//! ├─────────────────────┤
//! │  maxbot-core        │  (collaborator traits)
//! ├─────────────────────┤
//! │  maxbot-transport   │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use maxbot_transport::http::WebhookServer;
//!
//! let handle = WebhookServer::listen("0.0.0.0:8080", "/webhook", container).await?;
//! // ...
//! handle.shutdown().await;
//! ```

pub mod error;

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

pub use error::{TransportError, TransportResult};

#[cfg(feature = "http-server")]
pub use http::{ListenerHandle, WebhookServer, webhook_router};

#[cfg(feature = "http-client")]
pub use http::{DEFAULT_BASE_URL, HttpApiClient};
