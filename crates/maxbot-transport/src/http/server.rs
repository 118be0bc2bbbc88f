//! Webhook HTTP server.
//!
//! Every request under the path prefix is forwarded to a
//! [`WebhookHandler`] with the prefix stripped, so a bot container mounted at
//! `/webhook` sees `/echo` for `POST /webhook/echo`. A `POST` outside the
//! prefix is answered with `404` without reaching the handler; other methods
//! are forwarded with the full path, so verification pings get the handler's
//! answer (`"OK"` from the bot container) on any path.
//!
//! | Handler result | HTTP |
//! |----------------|------|
//! | `Ok(body)` | `200` with `body` |
//! | `BotNotFound` | `404` |
//! | `Serialization` | `500` |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use maxbot_core::{WebhookError, WebhookHandler};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::error::{TransportError, TransportResult};

/// Shared state for the webhook router.
struct ServerState {
    /// Normalized prefix: empty, or `/segment` without a trailing slash.
    prefix: String,
    handler: Arc<dyn WebhookHandler>,
}

/// Builds the axum router that feeds `handler`.
///
/// Exposed for embedding into a larger application and for tests.
pub fn webhook_router(prefix: &str, handler: Arc<dyn WebhookHandler>) -> Router {
    let state = Arc::new(ServerState {
        prefix: normalize_prefix(prefix),
        handler,
    });

    Router::new().fallback(dispatch).with_state(state)
}

/// The webhook HTTP server.
pub struct WebhookServer;

impl WebhookServer {
    /// Binds `addr` and serves webhook requests until the returned handle is
    /// stopped or dropped.
    pub async fn listen(
        addr: &str,
        prefix: &str,
        handler: Arc<dyn WebhookHandler>,
    ) -> TransportResult<ListenerHandle> {
        let router = webhook_router(prefix, handler);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, prefix = %normalize_prefix(prefix), "Webhook server listening");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });

            if let Err(e) = server.await {
                error!(error = %e, "Webhook server error");
            }
            info!(addr = %local_addr, "Webhook server stopped");
        });

        Ok(ListenerHandle::new(local_addr, shutdown_tx, task))
    }
}

/// Handle to a running webhook server.
///
/// Dropping the handle signals a graceful shutdown.
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    fn new(local_addr: SocketAddr, shutdown_tx: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals shutdown without waiting.
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Signals shutdown and waits for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Webhook server task ended abnormally");
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("local_addr", &self.local_addr)
            .field("running", &self.shutdown_tx.is_some())
            .finish()
    }
}

/// Catch-all request handler.
async fn dispatch(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    // Non-POST requests are verification pings the handler answers for any
    // path, so only POST is confined to the prefix.
    let path = match relative_path(&state.prefix, uri.path()) {
        Some(path) => path,
        None if method != Method::POST => uri.path(),
        None => {
            debug!(path = %uri.path(), "Request outside webhook prefix");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    trace!(method = %method, path = %path, len = body.len(), "Webhook request");

    match state
        .handler
        .handle_request(path, method.as_str(), &body)
        .await
    {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => error_response(path, &e),
    }
}

fn error_response(path: &str, e: &WebhookError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(path = %path, error = %e, "Webhook request failed");
    } else {
        warn!(path = %path, error = %e, "Webhook request rejected");
    }

    (status, e.to_string()).into_response()
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Strips `prefix` from `path` on a segment boundary.
fn relative_path<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
