use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use super::update::Update;

/// A webhook subscription registered on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Webhook URL.
    pub url: String,
    /// Creation time (ms since epoch).
    #[serde(default)]
    pub time: i64,
    /// Update types delivered to this URL; `None` means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_types: Option<Vec<String>>,
}

/// Request body for creating a webhook subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Webhook URL the platform will POST updates to.
    pub url: String,
    /// Update types to deliver; `None` means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_types: Option<Vec<String>>,
}

impl SubscriptionRequest {
    /// Creates a subscription request for `url`.
    pub fn new(url: impl Into<String>, update_types: Option<Vec<String>>) -> Self {
        Self {
            url: url.into(),
            update_types,
        }
    }
}

/// Generic success/failure answer of the platform API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleResult {
    /// Whether the call succeeded.
    pub success: bool,
    /// Explanation on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A page of updates returned by long polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateList {
    /// Updates in delivery order. Malformed entries are dropped so the
    /// rest of the page, and its marker, still get through.
    #[serde(default, deserialize_with = "skip_malformed_updates")]
    pub updates: Vec<Update>,
    /// Marker to pass to the next request.
    #[serde(default)]
    pub marker: Option<i64>,
}

fn skip_malformed_updates<'de, D>(deserializer: D) -> Result<Vec<Update>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Update>(value) {
            Ok(update) => Some(update),
            Err(e) => {
                warn!(error = %e, "Skipping malformed update");
                None
            }
        })
        .collect())
}

/// Body of an outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NewMessageBody {
    /// Message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attachments as raw platform JSON.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Value>,
}

impl NewMessageBody {
    /// Creates a text-only message body.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_list_skips_malformed_updates() {
        let page = r#"{
            "updates": [
                {"update_type": "bot_started", "timestamp": 1, "chat_id": 9,
                 "user": {"user_id": 3, "first_name": "Bob"}},
                {"update_type": "message_created", "timestamp": 2,
                 "message": {"timestamp": 2, "body": {"mid": "m1", "text": "hi"}}}
            ],
            "marker": 77
        }"#;

        let list: UpdateList = serde_json::from_str(page).unwrap();
        assert_eq!(list.marker, Some(77));
        assert_eq!(list.updates.len(), 1);
        assert_eq!(list.updates[0].update_type(), "bot_started");
    }

    #[test]
    fn test_update_list_defaults() {
        let list: UpdateList = serde_json::from_str("{}").unwrap();
        assert!(list.updates.is_empty());
        assert_eq!(list.marker, None);
    }
}
