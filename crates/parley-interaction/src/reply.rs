//! Reply payload normalization.
//!
//! The workflow endpoints have gone through several response formats over
//! time. This module maps every known shape to a single display string. The
//! precedence order is a compatibility contract: it must not be reordered.

use serde_json::Value;

/// Shown when no known payload shape matches.
pub const FALLBACK_REPLY: &str = "I received your message, but I'm not sure how to respond to it. Please try again or ask something else.";

/// Emitted by the workflow engine when a run was only enqueued; it carries
/// no assistant text and must not be surfaced as a reply.
const WORKFLOW_STARTED_SENTINEL: &str = "Workflow was started";

/// A reply payload classified into one of the known historical shapes.
///
/// Variants are listed in precedence order; [`ReplyShape::classify`] walks
/// them top to bottom and stops at the first match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyShape {
    /// `{"message": {"content": "..."}}`
    NestedMessageContent(String),
    /// `[{"output": "..."}]`
    FirstElementOutput(String),
    /// `[{"message": {"content": "..."}}]`
    FirstElementMessageContent(String),
    /// `{"output": "..."}`
    TopLevelOutput(String),
    /// `{"reply": "..."}`
    TopLevelReply(String),
    /// `{"message": "..."}` with a non-sentinel string
    BareMessage(String),
    /// Nothing recognizable.
    Unrecognized,
}

impl ReplyShape {
    /// Classifies a payload by walking the precedence order.
    pub fn classify(payload: &Value) -> ReplyShape {
        if let Some(text) = nested_message_content(payload) {
            return ReplyShape::NestedMessageContent(text);
        }
        if let Some(first) = payload.as_array().and_then(|items| items.first()) {
            if let Some(text) = string_field(first, "output") {
                return ReplyShape::FirstElementOutput(text);
            }
            if let Some(text) = nested_message_content(first) {
                return ReplyShape::FirstElementMessageContent(text);
            }
        }
        if let Some(text) = string_field(payload, "output") {
            return ReplyShape::TopLevelOutput(text);
        }
        if let Some(text) = string_field(payload, "reply") {
            return ReplyShape::TopLevelReply(text);
        }
        if let Some(text) = string_field(payload, "message") {
            if text != WORKFLOW_STARTED_SENTINEL {
                return ReplyShape::BareMessage(text);
            }
        }
        ReplyShape::Unrecognized
    }

    /// The display text for this shape.
    pub fn into_text(self) -> String {
        match self {
            ReplyShape::NestedMessageContent(text)
            | ReplyShape::FirstElementOutput(text)
            | ReplyShape::FirstElementMessageContent(text)
            | ReplyShape::TopLevelOutput(text)
            | ReplyShape::TopLevelReply(text)
            | ReplyShape::BareMessage(text) => text,
            ReplyShape::Unrecognized => FALLBACK_REPLY.to_string(),
        }
    }
}

/// Maps an arbitrary response payload to a display string.
pub fn extract_reply(payload: &Value) -> String {
    ReplyShape::classify(payload).into_text()
}

fn nested_message_content(value: &Value) -> Option<String> {
    value
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field)?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_message_content() {
        assert_eq!(extract_reply(&json!({"message": {"content": "A"}})), "A");
    }

    #[test]
    fn test_first_element_output() {
        assert_eq!(extract_reply(&json!([{"output": "B"}])), "B");
    }

    #[test]
    fn test_first_element_message_content() {
        assert_eq!(
            extract_reply(&json!([{"message": {"content": "nested"}}])),
            "nested"
        );
    }

    #[test]
    fn test_top_level_output() {
        assert_eq!(extract_reply(&json!({"output": "out"})), "out");
    }

    #[test]
    fn test_top_level_reply() {
        assert_eq!(extract_reply(&json!({"reply": "C"})), "C");
    }

    #[test]
    fn test_bare_message_string() {
        assert_eq!(extract_reply(&json!({"message": "plain"})), "plain");
    }

    #[test]
    fn test_workflow_started_sentinel_falls_back() {
        assert_eq!(
            extract_reply(&json!({"message": "Workflow was started"})),
            FALLBACK_REPLY
        );
    }

    #[test]
    fn test_empty_object_falls_back() {
        assert_eq!(extract_reply(&json!({})), FALLBACK_REPLY);
    }

    #[test]
    fn test_nested_content_beats_reply() {
        let payload = json!({"message": {"content": "A"}, "reply": "C"});
        assert_eq!(extract_reply(&payload), "A");
    }

    #[test]
    fn test_array_output_beats_array_message_content() {
        let payload = json!([{"output": "B", "message": {"content": "X"}}]);
        assert_eq!(extract_reply(&payload), "B");
    }

    #[test]
    fn test_non_string_fields_are_ignored() {
        let payload = json!({"output": 42, "reply": "C"});
        assert_eq!(extract_reply(&payload), "C");
    }

    #[test]
    fn test_classify_exposes_shape() {
        assert_eq!(
            ReplyShape::classify(&json!({"reply": "C"})),
            ReplyShape::TopLevelReply("C".to_string())
        );
        assert_eq!(ReplyShape::classify(&json!(null)), ReplyShape::Unrecognized);
    }
}
