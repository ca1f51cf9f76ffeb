//! Session domain model.
//!
//! This module contains the core Session entity that represents
//! a single conversation thread in the application's domain layer.

use super::message::{Message, MessageRole};
use super::mode::ChatMode;
use serde::{Deserialize, Serialize};

/// Maximum number of characters of the first user input used for the title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Represents a conversation thread in the application's domain layer.
///
/// A session contains:
/// - Its opaque unique identifier
/// - A display title and a one-line preview of the latest exchange
/// - The ordered message history (insertion order, rendered chronologically)
/// - An optional folder assignment for sidebar grouping
/// - The chat mode the conversation is bound to
///
/// This is the "pure" domain model that business logic operates on,
/// independent of any specific storage format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Human-readable session title.
    pub title: String,
    /// Preview text shown in listings (latest user input or assistant reply).
    pub preview: String,
    /// Timestamp when the session was created (ISO 8601 format).
    pub created_at: String,
    /// Ordered conversation history.
    pub messages: Vec<Message>,
    /// Folder this session is filed under, if any.
    #[serde(default)]
    pub folder_id: Option<String>,
    /// The chat mode this session is bound to.
    #[serde(default)]
    pub mode: ChatMode,
}

impl Session {
    /// Creates an empty session with the given identity and mode.
    pub fn new(id: impl Into<String>, mode: ChatMode, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: "New Chat".to_string(),
            preview: String::new(),
            created_at: created_at.into(),
            messages: Vec::new(),
            folder_id: None,
            mode,
        }
    }

    /// Whether the user has contributed at least one message.
    ///
    /// Sessions without a user message (e.g. ones holding only an assistant
    /// greeting) are persisted but stay hidden from listings until the user
    /// replies.
    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == MessageRole::User)
    }

    /// Whether the chat mode may no longer be changed.
    ///
    /// A session is locked once the conversation has progressed past a
    /// single message.
    pub fn mode_locked(&self) -> bool {
        self.messages.len() > 1
    }

    /// Whether any message is still a pending placeholder.
    pub fn has_pending_message(&self) -> bool {
        self.messages.iter().any(Message::is_pending)
    }

    /// Derives a session title from the first user input.
    ///
    /// Takes the first [`TITLE_MAX_CHARS`] characters and appends `...`
    /// when the input was truncated. Counted in characters, not bytes.
    pub fn derive_title(input: &str) -> String {
        let mut title: String = input.chars().take(TITLE_MAX_CHARS).collect();
        if input.chars().count() > TITLE_MAX_CHARS {
            title.push_str("...");
        }
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_input() {
        assert_eq!(Session::derive_title("hello"), "hello");
    }

    #[test]
    fn test_derive_title_truncates_long_input() {
        let input = "a".repeat(40);
        let title = Session::derive_title(&input);
        assert_eq!(title, format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn test_derive_title_exact_limit_is_not_ellipsised() {
        let input = "b".repeat(30);
        assert_eq!(Session::derive_title(&input), input);
    }

    #[test]
    fn test_derive_title_counts_characters_not_bytes() {
        let input = "é".repeat(31);
        let title = Session::derive_title(&input);
        assert_eq!(title, format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_has_user_message() {
        let mut session = Session::new("s-1", ChatMode::Chat, "2024-01-01T00:00:00Z");
        assert!(!session.has_user_message());

        session
            .messages
            .push(Message::assistant("m-1", "Hello!", "2024-01-01T00:00:00Z"));
        assert!(!session.has_user_message());

        session
            .messages
            .push(Message::user("m-2", "hi", "2024-01-01T00:00:01Z"));
        assert!(session.has_user_message());
    }

    #[test]
    fn test_mode_locked_after_second_message() {
        let mut session = Session::new("s-1", ChatMode::Research, "2024-01-01T00:00:00Z");
        assert!(!session.mode_locked());

        session
            .messages
            .push(Message::user("m-1", "hi", "2024-01-01T00:00:00Z"));
        assert!(!session.mode_locked());

        session
            .messages
            .push(Message::assistant("m-2", "hello", "2024-01-01T00:00:01Z"));
        assert!(session.mode_locked());
    }
}
