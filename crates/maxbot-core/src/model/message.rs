use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub user_id: i64,
    /// Display first name.
    pub first_name: String,
    /// Display last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Unique public name, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Whether the user is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// Time of last activity (ms since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_time: Option<i64>,
}

/// Kind of chat a message was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// One-to-one dialog with the bot.
    #[default]
    Dialog,
    /// Group chat.
    Chat,
    /// Channel.
    Channel,
    /// A chat type this version does not know about.
    #[serde(other)]
    Unknown,
}

/// Where a message was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Recipient {
    /// Chat identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    /// Chat kind.
    #[serde(default)]
    pub chat_type: ChatType,
    /// Recipient user for dialogs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MessageBody {
    /// Message identifier.
    pub mid: String,
    /// Sequence number within the chat.
    #[serde(default)]
    pub seq: i64,
    /// Text, absent for attachment-only or service messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attachments, kept as raw platform JSON.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Value>,
}

/// A message received from the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author, absent for channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<User>,
    /// Destination chat.
    pub recipient: Recipient,
    /// Creation time (ms since epoch).
    pub timestamp: i64,
    /// Content.
    pub body: MessageBody,
}

impl Message {
    /// Creates a plain text message addressed to `chat_id`.
    pub fn with_text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            sender: None,
            recipient: Recipient {
                chat_id: Some(chat_id),
                ..Default::default()
            },
            timestamp: 0,
            body: MessageBody {
                text: Some(text.into()),
                ..Default::default()
            },
        }
    }

    /// Returns the text body, if any.
    pub fn text(&self) -> Option<&str> {
        self.body.text.as_deref()
    }

    /// Returns the chat the message belongs to.
    pub fn chat_id(&self) -> Option<i64> {
        self.recipient.chat_id
    }

    /// Returns whether the message carries attachments.
    pub fn has_attachments(&self) -> bool {
        !self.body.attachments.is_empty()
    }
}

/// A button press on an inline keyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    /// Press time (ms since epoch).
    pub timestamp: i64,
    /// Identifier used to answer the callback.
    pub callback_id: String,
    /// Button payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// User who pressed the button.
    pub user: User,
}
