//! Storage DTOs for the durable session store.
//!
//! The durable format keeps the historical browser-storage shape: camelCase
//! field names, an optional `type` discriminator for non-plain modes, and an
//! array document containing every session. Domain conversions keep business
//! logic independent of this shape.

use parley_core::session::{ChatMode, Message, MessageRole, Session};
use serde::{Deserialize, Serialize};

/// Persisted form of a single conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    pub timestamp: String,
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            role: message.role,
            content: message.content.clone(),
            timestamp: message.timestamp.clone(),
        }
    }
}

impl MessageRecord {
    /// Converts the record into the domain model.
    pub fn into_domain(self) -> Message {
        Message {
            id: self.id,
            role: self.role,
            content: self.content,
            timestamp: self.timestamp,
        }
    }
}

/// Persisted form of a session.
///
/// The `type` field is omitted for plain chat sessions; unknown values
/// decode to plain chat rather than failing the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub preview: String,
    pub created_at: String,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            preview: session.preview.clone(),
            created_at: session.created_at.clone(),
            messages: session.messages.iter().map(MessageRecord::from).collect(),
            folder_id: session.folder_id.clone(),
            kind: if session.mode.is_plain() {
                None
            } else {
                Some(session.mode.as_str().to_string())
            },
        }
    }
}

impl SessionRecord {
    /// Converts the record into the domain model.
    pub fn into_domain(self) -> Session {
        let mode = self
            .kind
            .as_deref()
            .and_then(|kind| kind.parse::<ChatMode>().ok())
            .unwrap_or_default();

        Session {
            id: self.id,
            title: self.title,
            preview: self.preview,
            created_at: self.created_at,
            messages: self
                .messages
                .into_iter()
                .map(MessageRecord::into_domain)
                .collect(),
            folder_id: self.folder_id,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        let mut session = Session::new("s-1", ChatMode::Research, "2024-01-01T00:00:00Z");
        session.title = "hello".to_string();
        session.preview = "hi there".to_string();
        session
            .messages
            .push(Message::user("m-1", "hello", "2024-01-01T00:00:00Z"));
        session
            .messages
            .push(Message::assistant("m-2", "hi there", "2024-01-01T00:00:01Z"));
        session
    }

    #[test]
    fn test_record_round_trips_domain() {
        let session = sample_session();
        let record = SessionRecord::from(&session);
        assert_eq!(record.into_domain(), session);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = SessionRecord::from(&sample_session());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"type\":\"research\""));
        assert!(!json.contains("folder_id"));
    }

    #[test]
    fn test_plain_chat_omits_type_field() {
        let session = Session::new("s-2", ChatMode::Chat, "2024-01-01T00:00:00Z");
        let json = serde_json::to_string(&SessionRecord::from(&session)).unwrap();
        assert!(!json.contains("\"type\""));
    }

    #[test]
    fn test_unknown_mode_decodes_to_plain_chat() {
        let json = r#"{
            "id": "s-3",
            "title": "t",
            "createdAt": "2024-01-01T00:00:00Z",
            "type": "mystery"
        }"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.into_domain().mode, ChatMode::Chat);
    }
}
