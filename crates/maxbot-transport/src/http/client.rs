//! Platform API client over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use maxbot_core::{
    ApiError, ApiResult, Message, NewMessageBody, PlatformClient, SimpleResult, Subscription,
    SubscriptionRequest, UpdateList, UpdatesQuery,
};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

/// Default platform API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://botapi.max.ru";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct SubscriptionList {
    #[serde(default)]
    subscriptions: Vec<Subscription>,
}

#[derive(Deserialize)]
struct SentMessage {
    message: Message,
}

/// HTTP implementation of [`PlatformClient`].
///
/// Every call carries the bot token as the `access_token` query parameter.
/// Non-success responses become [`ApiError::Status`]; there are no retries.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl HttpApiClient {
    /// Creates a client against [`DEFAULT_BASE_URL`] with a 30 second timeout.
    pub fn new(access_token: impl Into<String>) -> ApiResult<Self> {
        Self::with_options(access_token, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom endpoint and request timeout.
    pub fn with_options(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout,
        })
    }

    /// Returns the API endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .query(&[("access_token", self.access_token.as_str())])
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), message = %message, "API call failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Query parameters for the `updates` call.
fn updates_params(query: &UpdatesQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(timeout) = query.timeout {
        params.push(("timeout", timeout.to_string()));
    }
    if let Some(marker) = query.marker {
        params.push(("marker", marker.to_string()));
    }
    if let Some(types) = &query.types
        && !types.is_empty()
    {
        params.push(("types", types.join(",")));
    }
    params
}

#[async_trait]
impl PlatformClient for HttpApiClient {
    async fn subscriptions(&self) -> ApiResult<Vec<Subscription>> {
        let list: SubscriptionList = self.call(self.request(Method::GET, "subscriptions")).await?;
        Ok(list.subscriptions)
    }

    async fn subscribe(&self, request: &SubscriptionRequest) -> ApiResult<SimpleResult> {
        debug!(url = %request.url, "Subscribing webhook");
        self.call(self.request(Method::POST, "subscriptions").json(request))
            .await
    }

    async fn unsubscribe(&self, url: &str) -> ApiResult<SimpleResult> {
        debug!(url = %url, "Removing webhook subscription");
        self.call(
            self.request(Method::DELETE, "subscriptions")
                .query(&[("url", url)]),
        )
        .await
    }

    async fn get_updates(&self, query: &UpdatesQuery) -> ApiResult<UpdateList> {
        trace!(marker = ?query.marker, "Polling updates");
        // The server holds the request open for up to `timeout` seconds.
        let wait = Duration::from_secs(query.timeout.map(u64::from).unwrap_or(0));
        self.call(
            self.request(Method::GET, "updates")
                .query(&updates_params(query))
                .timeout(self.timeout + wait),
        )
        .await
    }

    async fn send_message(&self, chat_id: i64, body: &NewMessageBody) -> ApiResult<Message> {
        trace!(chat_id = chat_id, "Sending message");
        let sent: SentMessage = self
            .call(
                self.request(Method::POST, "messages")
                    .query(&[("chat_id", chat_id)])
                    .json(body),
            )
            .await?;
        Ok(sent.message)
    }
}
