use serde::{Deserialize, Serialize};

use super::message::{Callback, Message, User};

/// An inbound event from the messaging platform.
///
/// Tagged by the `update_type` field. Tags this version does not model
/// deserialize to [`Update::Unknown`] so a new platform event never breaks
/// routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "update_type", rename_all = "snake_case")]
pub enum Update {
    /// A new message was sent.
    MessageCreated {
        timestamp: i64,
        message: Message,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_locale: Option<String>,
    },

    /// A message was edited.
    MessageEdited { timestamp: i64, message: Message },

    /// A message was removed.
    MessageRemoved {
        timestamp: i64,
        message_id: String,
        chat_id: i64,
        user_id: i64,
    },

    /// An inline keyboard button was pressed.
    MessageCallback {
        timestamp: i64,
        callback: Callback,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<Message>,
    },

    /// A user pressed "Start" in a dialog with the bot.
    BotStarted {
        timestamp: i64,
        chat_id: i64,
        user: User,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
    },

    /// The bot was added to a chat.
    BotAdded {
        timestamp: i64,
        chat_id: i64,
        user: User,
        #[serde(default)]
        is_channel: bool,
    },

    /// The bot was removed from a chat.
    BotRemoved {
        timestamp: i64,
        chat_id: i64,
        user: User,
        #[serde(default)]
        is_channel: bool,
    },

    /// A user joined a chat.
    UserAdded {
        timestamp: i64,
        chat_id: i64,
        user: User,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inviter_id: Option<i64>,
    },

    /// A user left a chat.
    UserRemoved {
        timestamp: i64,
        chat_id: i64,
        user: User,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        admin_id: Option<i64>,
    },

    /// A chat was renamed.
    ChatTitleChanged {
        timestamp: i64,
        chat_id: i64,
        user: User,
        title: String,
    },

    /// An update type this version does not model.
    #[serde(other)]
    Unknown,
}

impl Update {
    /// Returns the wire tag of this update.
    pub fn update_type(&self) -> &'static str {
        match self {
            Self::MessageCreated { .. } => "message_created",
            Self::MessageEdited { .. } => "message_edited",
            Self::MessageRemoved { .. } => "message_removed",
            Self::MessageCallback { .. } => "message_callback",
            Self::BotStarted { .. } => "bot_started",
            Self::BotAdded { .. } => "bot_added",
            Self::BotRemoved { .. } => "bot_removed",
            Self::UserAdded { .. } => "user_added",
            Self::UserRemoved { .. } => "user_removed",
            Self::ChatTitleChanged { .. } => "chat_title_changed",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the event time, if the update carries one.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::MessageCreated { timestamp, .. }
            | Self::MessageEdited { timestamp, .. }
            | Self::MessageRemoved { timestamp, .. }
            | Self::MessageCallback { timestamp, .. }
            | Self::BotStarted { timestamp, .. }
            | Self::BotAdded { timestamp, .. }
            | Self::BotRemoved { timestamp, .. }
            | Self::UserAdded { timestamp, .. }
            | Self::UserRemoved { timestamp, .. }
            | Self::ChatTitleChanged { timestamp, .. } => Some(*timestamp),
            Self::Unknown => None,
        }
    }

    /// Returns the message carried by this update, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::MessageCreated { message, .. } | Self::MessageEdited { message, .. } => {
                Some(message)
            }
            Self::MessageCallback { message, .. } => message.as_ref(),
            _ => None,
        }
    }

    /// Returns the chat this update relates to, if known.
    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Self::MessageRemoved { chat_id, .. }
            | Self::BotStarted { chat_id, .. }
            | Self::BotAdded { chat_id, .. }
            | Self::BotRemoved { chat_id, .. }
            | Self::UserAdded { chat_id, .. }
            | Self::UserRemoved { chat_id, .. }
            | Self::ChatTitleChanged { chat_id, .. } => Some(*chat_id),
            _ => self.message().and_then(Message::chat_id),
        }
    }
}
