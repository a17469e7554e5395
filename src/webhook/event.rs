//! Inbound webhook payloads from Twilio Conversations.

use serde::{Deserialize, Serialize};

/// Event type sent when a participant posts a message.
pub const ON_MESSAGE_ADDED: &str = "onMessageAdded";
/// Event type sent when a conversation is deleted.
pub const ON_CONVERSATION_REMOVED: &str = "onConversationRemoved";

/// Form-encoded webhook body. Fields the provider adds beyond these are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebhookEvent {
    /// Event type, e.g. `onMessageAdded`.
    pub event_type: String,
    /// Conversation the event belongs to.
    #[serde(default)]
    pub conversation_sid: String,
    /// Message identifier.
    #[serde(default)]
    pub message_sid: String,
    /// Messaging service identifier.
    #[serde(default)]
    pub messaging_service_sid: String,
    /// Position of the message in the conversation.
    #[serde(default)]
    pub index: i64,
    /// Creation timestamp, as sent.
    #[serde(default)]
    pub date_created: String,
    /// Message text.
    #[serde(default)]
    pub body: String,
    /// Message author.
    #[serde(default)]
    pub author: String,
    /// Participant identifier.
    #[serde(default)]
    pub participant_sid: String,
    /// Message attributes (JSON string).
    #[serde(default)]
    pub attributes: String,
    /// Media descriptor (JSON string).
    #[serde(default)]
    pub media: String,
    /// Channel metadata (JSON string).
    #[serde(default)]
    pub channel_metadata: String,
}

impl WebhookEvent {
    /// Classified event type.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event_type)
    }
}

/// The event types the relay acts on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    /// A message was posted.
    MessageAdded,
    /// The conversation was deleted.
    ConversationRemoved,
    /// Anything else.
    Unknown,
}

impl EventKind {
    /// Classify a raw event type string.
    #[must_use]
    pub fn parse(event_type: &str) -> Self {
        match event_type {
            ON_MESSAGE_ADDED => Self::MessageAdded,
            ON_CONVERSATION_REMOVED => Self::ConversationRemoved,
            _ => Self::Unknown,
        }
    }
}
