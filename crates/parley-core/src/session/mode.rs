//! Chat mode types for session state management.

use serde::{Deserialize, Serialize};

/// The conversational variant a session is bound to.
///
/// Every session carries exactly one mode. Plain chat is the default; the
/// research and report modes route messages to their own workflow endpoints.
/// The mode becomes immutable once a conversation has progressed past its
/// first exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Plain conversational chat.
    #[default]
    Chat,
    /// Deep research workflow.
    Research,
    /// Report generation workflow.
    Report,
}

impl ChatMode {
    /// The wire value used for the `type` query parameter and stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Chat => "chat",
            ChatMode::Research => "research",
            ChatMode::Report => "report",
        }
    }

    /// Whether this is the default plain-chat mode.
    pub fn is_plain(&self) -> bool {
        matches!(self, ChatMode::Chat)
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" | "none" | "plain" => Ok(ChatMode::Chat),
            "research" => Ok(ChatMode::Research),
            "report" => Ok(ChatMode::Report),
            other => Err(format!("Unknown chat mode: '{other}'")),
        }
    }
}
