//! Test doubles shared by the runtime's unit tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use maxbot_core::{
    ApiError, ApiResult, Message, NewMessageBody, PlatformClient, SimpleResult, Subscription,
    SubscriptionRequest, UpdateList, UpdatesQuery,
};
use parking_lot::Mutex;

#[derive(Default)]
struct MockState {
    subscriptions: Vec<Subscription>,
    subscribed: Vec<String>,
    unsubscribed: Vec<String>,
    reject: bool,
    polls: VecDeque<ApiResult<UpdateList>>,
    queries: Vec<UpdatesQuery>,
    sent: Vec<(i64, NewMessageBody)>,
}

/// In-memory [`PlatformClient`] that records every call.
///
/// `get_updates` answers from a queue and hangs once it is empty.
#[derive(Default)]
pub(crate) struct MockClient {
    state: Mutex<MockState>,
}

impl MockClient {
    pub(crate) fn set_subscriptions(&self, subscriptions: Vec<Subscription>) {
        self.state.lock().subscriptions = subscriptions;
    }

    pub(crate) fn reject_subscriptions(&self) {
        self.state.lock().reject = true;
    }

    pub(crate) fn push_poll(&self, result: ApiResult<UpdateList>) {
        self.state.lock().polls.push_back(result);
    }

    pub(crate) fn subscribed(&self) -> Vec<String> {
        self.state.lock().subscribed.clone()
    }

    pub(crate) fn unsubscribed(&self) -> Vec<String> {
        self.state.lock().unsubscribed.clone()
    }

    pub(crate) fn queries(&self) -> Vec<UpdatesQuery> {
        self.state.lock().queries.clone()
    }

    pub(crate) fn sent(&self) -> Vec<(i64, NewMessageBody)> {
        self.state.lock().sent.clone()
    }

    /// Waits until `get_updates` has been called at least `n` times.
    pub(crate) async fn wait_for_queries(&self, n: usize) {
        for _ in 0..500 {
            if self.state.lock().queries.len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} polls, got {}", self.state.lock().queries.len());
    }
}

#[async_trait]
impl PlatformClient for MockClient {
    async fn subscriptions(&self) -> ApiResult<Vec<Subscription>> {
        Ok(self.state.lock().subscriptions.clone())
    }

    async fn subscribe(&self, request: &SubscriptionRequest) -> ApiResult<SimpleResult> {
        let mut state = self.state.lock();
        if state.reject {
            return Ok(SimpleResult {
                success: false,
                message: Some("rejected".into()),
            });
        }
        state.subscribed.push(request.url.clone());
        Ok(SimpleResult {
            success: true,
            message: None,
        })
    }

    async fn unsubscribe(&self, url: &str) -> ApiResult<SimpleResult> {
        let mut state = self.state.lock();
        state.unsubscribed.push(url.to_string());
        state.subscriptions.retain(|s| s.url != url);
        Ok(SimpleResult {
            success: true,
            message: None,
        })
    }

    async fn get_updates(&self, query: &UpdatesQuery) -> ApiResult<UpdateList> {
        let next = {
            let mut state = self.state.lock();
            state.queries.push(query.clone());
            state.polls.pop_front()
        };
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn send_message(&self, chat_id: i64, body: &NewMessageBody) -> ApiResult<Message> {
        self.state.lock().sent.push((chat_id, body.clone()));
        let text = body
            .text
            .clone()
            .ok_or_else(|| ApiError::Other("empty message".into()))?;
        Ok(Message::with_text(chat_id, text))
    }
}
