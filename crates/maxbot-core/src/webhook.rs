//! Inbound webhook contract between the HTTP layer and a bot container.

use async_trait::async_trait;

use crate::error::WebhookResult;

/// Handles raw webhook requests.
///
/// Implemented by the bot container; called by the HTTP server once per
/// request, concurrently.
#[async_trait]
pub trait WebhookHandler: Send + Sync + 'static {
    /// Routes one request and returns the response body.
    ///
    /// # Arguments
    ///
    /// * `path` - Request path relative to the server's mount point
    /// * `method` - HTTP method name, upper case
    /// * `body` - Raw request body
    async fn handle_request(&self, path: &str, method: &str, body: &[u8]) -> WebhookResult<String>;
}
