//! Application configuration model.
//!
//! The configuration is owned by the core crate; loading and persistence
//! live in the infrastructure crate.

use serde::{Deserialize, Serialize};

fn default_chat_url() -> String {
    "http://localhost:5678/webhook/chat".to_string()
}

fn default_research_url() -> String {
    "http://localhost:5678/webhook/research".to_string()
}

fn default_report_url() -> String {
    "http://localhost:5678/webhook/report".to_string()
}

fn default_greeting() -> String {
    "Hello! How can I help you today?".to_string()
}

/// Outbound workflow endpoint URLs, one per chat mode.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Endpoint for plain chat messages.
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    /// Endpoint for research-mode messages.
    #[serde(default = "default_research_url")]
    pub research_url: String,
    /// Endpoint for report-mode messages.
    #[serde(default = "default_report_url")]
    pub report_url: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            research_url: default_research_url(),
            report_url: default_report_url(),
        }
    }
}

/// Root configuration loaded from `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    /// Workflow webhook endpoints.
    #[serde(default)]
    pub webhooks: WebhookConfig,
    /// Assistant greeting seeded into freshly created sessions.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            webhooks: WebhookConfig::default(),
            greeting: default_greeting(),
        }
    }
}
