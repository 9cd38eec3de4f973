//! Chat data models
//!
//! Defines structures for chat messages and user-facing notices.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Unique identifier for a chat message
pub type MessageId = String;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user
    User,
    /// Message from the agent
    Agent,
}

impl MessageRole {
    /// Convert the role to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
        }
    }
}

/// Thumbs-up / thumbs-down on an agent message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// Helpful response
    Good,
    /// Unhelpful response
    Bad,
}

/// A single message in a chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier for the message
    pub id: MessageId,
    /// Role of the message sender
    pub role: MessageRole,
    /// Text content of the message
    pub content: String,
    /// Attached image as a data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// User feedback on an agent message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    /// When the message was created (Unix timestamp)
    pub created_at: i64,
}

impl ChatMessage {
    /// Create a new message
    pub fn new(role: MessageRole, content: String, image: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            image,
            feedback: None,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// Error notification raised by a failed turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Short headline
    pub title: String,
    /// Human-readable detail
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json_shape() {
        let mut message = ChatMessage::new(MessageRole::Agent, "Hi".to_string(), None);
        message.feedback = Some(Feedback::Good);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "agent");
        assert_eq!(json["feedback"], "good");
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_message_ids_unique() {
        let a = ChatMessage::new(MessageRole::User, "a".to_string(), None);
        let b = ChatMessage::new(MessageRole::User, "a".to_string(), None);
        assert_ne!(a.id, b.id);
        assert_eq!(a.role.as_str(), "user");
    }
}
