use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ChatError, Result};

static LAST_MESSAGE_ID: AtomicU64 = AtomicU64::new(0);

/// Time-based message identifier, strictly increasing within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Allocate the next id: the current epoch millisecond, bumped past
    /// the last id handed out when two messages land in the same millisecond
    pub fn next() -> Self {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = LAST_MESSAGE_ID.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match LAST_MESSAGE_ID.compare_exchange_weak(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a chat participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Viewer,
    Streamer,
}

/// Sender identity, copied into every message at send time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: u64,
    pub username: String,
    pub role: UserRole,
    pub avatar: String,
}

impl ChatUser {
    pub fn new(
        id: u64,
        username: impl Into<String>,
        role: UserRole,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            avatar: avatar.into(),
        }
    }

    pub fn is_streamer(&self) -> bool {
        self.role == UserRole::Streamer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub user: ChatUser,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(user: ChatUser, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::next(),
            user,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether the text carries anything worth displaying
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ChatError::SerializationError(e.to_string()))
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| ChatError::MessageParseError(e.to_string()))
    }
}

/// Inbound event delivered to message handlers
///
/// Serialized as `{"type": "chat", "data": {...}}`. The tag leaves room for
/// event kinds other than chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChatEvent {
    Chat(ChatMessage),
}

impl ChatEvent {
    pub fn as_chat(&self) -> Option<&ChatMessage> {
        match self {
            Self::Chat(message) => Some(message),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ChatError::SerializationError(e.to_string()))
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| ChatError::MessageParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn viewer() -> ChatUser {
        ChatUser::new(2, "viewer123", UserRole::Viewer, "https://example.com/a.png")
    }

    #[test]
    fn test_message_creation() {
        let msg = ChatMessage::new(viewer(), "Hello");
        assert_eq!(msg.user.username, "viewer123");
        assert_eq!(msg.text, "Hello");
        assert!(msg.has_content());
    }

    #[test]
    fn test_blank_text_has_no_content() {
        assert!(!ChatMessage::new(viewer(), "").has_content());
        assert!(!ChatMessage::new(viewer(), " \t\n ").has_content());
    }

    #[test]
    fn test_ids_strictly_increase() {
        let ids: Vec<MessageId> = (0..1000).map(|_| MessageId::next()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_event_wire_shape() {
        let msg = ChatMessage::new(viewer(), "hi");
        let json = ChatEvent::Chat(msg.clone()).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "chat");
        assert_eq!(value["data"]["text"], "hi");
        assert_eq!(value["data"]["user"]["role"], "viewer");
        assert_eq!(value["data"]["id"], msg.id.0);
    }

    #[test]
    fn test_event_parse_rejects_unknown_type() {
        let result = ChatEvent::from_json(r#"{"type":"presence","data":{}}"#);
        assert!(matches!(result, Err(ChatError::MessageParseError(_))));
    }
}
