//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles and message content.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// A single message in a conversation history.
///
/// Each message has its own identity, a role, content, and a timestamp.
/// An assistant message with empty content is a transient "pending"
/// placeholder shown while awaiting a remote reply; it is always resolved
/// or discarded before the session is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier, unique within its session.
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message. Empty means "pending".
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl Message {
    /// Creates a user message.
    pub fn user(id: impl Into<String>, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(
        id: impl Into<String>,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Creates an empty-content assistant placeholder.
    pub fn pending(id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self::assistant(id, "", timestamp)
    }

    /// Whether this message is a transient pending placeholder.
    pub fn is_pending(&self) -> bool {
        self.role == MessageRole::Assistant && self.content.is_empty()
    }
}
