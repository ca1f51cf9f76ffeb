//! WebhookGateway - outbound calls to the workflow automation endpoints.
//!
//! Each chat mode binds to its own remote endpoint; request construction is
//! shared. Configuration priority: environment variables > config.toml.

use async_trait::async_trait;
use parley_core::config::WebhookConfig;
use parley_core::id::IdGenerator;
use parley_core::session::ChatMode;
use reqwest::Client;
use serde_json::Value;
use std::env;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised by webhook calls.
///
/// Every transport-level condition is converted into one of these variants;
/// nothing panics or escapes the gateway boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WebhookError {
    /// The message was empty after trimming.
    #[error("Webhook message must not be empty")]
    EmptyMessage,

    /// Network-level failure (connect, timeout, DNS).
    #[error("Webhook request failed: {message}")]
    Transport {
        message: String,
        is_retryable: bool,
    },

    /// The endpoint answered with a non-success status.
    #[error("Webhook endpoint returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    /// The response body was not valid JSON.
    #[error("Failed to parse webhook response: {0}")]
    Malformed(String),
}

/// The normalized result of a webhook call.
#[derive(Debug, Clone)]
pub struct WebhookReply {
    /// Session identifier the request was tagged with (generated when the
    /// caller supplied none).
    pub session_id: String,
    /// Raw JSON payload returned by the endpoint.
    pub payload: Value,
}

/// The outbound boundary the conversation flow talks to.
///
/// One entry point per chat mode. Implementations must convert every
/// transport condition into a [`WebhookError`] rather than panicking.
/// The production implementation is [`WebhookGateway`]; tests substitute
/// scripted fakes.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Sends a plain chat message.
    async fn send_chat(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<WebhookReply, WebhookError>;

    /// Sends a research-mode message.
    async fn send_research(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<WebhookReply, WebhookError>;

    /// Sends a report-mode message.
    async fn send_report(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<WebhookReply, WebhookError>;
}

/// Gateway translating application intents into outbound workflow calls.
///
/// Stateless per call: one HTTP GET, one attempt, no retry. Retries are a
/// caller concern and are intentionally not implemented here.
#[derive(Clone)]
pub struct WebhookGateway {
    client: Client,
    endpoints: WebhookConfig,
    ids: Arc<dyn IdGenerator>,
}

impl WebhookGateway {
    /// Creates a gateway over the given endpoints.
    pub fn new(endpoints: WebhookConfig, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            client: Client::new(),
            endpoints,
            ids,
        }
    }

    /// Creates a gateway from configuration, honoring environment overrides.
    ///
    /// `PARLEY_CHAT_WEBHOOK_URL`, `PARLEY_RESEARCH_WEBHOOK_URL`, and
    /// `PARLEY_REPORT_WEBHOOK_URL` take precedence over config.toml.
    pub fn from_config(config: &WebhookConfig, ids: Arc<dyn IdGenerator>) -> Self {
        let endpoints = WebhookConfig {
            chat_url: env::var("PARLEY_CHAT_WEBHOOK_URL").unwrap_or_else(|_| config.chat_url.clone()),
            research_url: env::var("PARLEY_RESEARCH_WEBHOOK_URL")
                .unwrap_or_else(|_| config.research_url.clone()),
            report_url: env::var("PARLEY_REPORT_WEBHOOK_URL")
                .unwrap_or_else(|_| config.report_url.clone()),
        };
        Self::new(endpoints, ids)
    }

    /// Sends a message to the endpoint bound to `mode`.
    ///
    /// A missing `session_id` is filled from the id generator so every call
    /// carries an identifier; the id actually used is part of the reply.
    pub async fn send(
        &self,
        mode: ChatMode,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<WebhookReply, WebhookError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(WebhookError::EmptyMessage);
        }

        let session_id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.ids.generate(),
        };

        let url = self.endpoint_for(mode);
        tracing::debug!(
            "[WebhookGateway] GET {} type={} sessionId={} message_len={}",
            url,
            mode,
            session_id,
            message.len()
        );

        let response = self
            .client
            .get(url)
            .query(&[
                ("message", message),
                ("sessionId", session_id.as_str()),
                ("type", mode.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| WebhookError::Transport {
                message: format!("{} webhook request failed: {}", mode, err),
                is_retryable: err.is_connect() || err.is_timeout(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read webhook error body".to_string());
            tracing::error!(
                "[WebhookGateway] {} endpoint returned status {}: {}",
                mode,
                status,
                body
            );
            return Err(WebhookError::Status {
                status_code: status.as_u16(),
                message: body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| WebhookError::Malformed(err.to_string()))?;

        tracing::debug!("[WebhookGateway] {} response payload: {}", mode, payload);

        Ok(WebhookReply {
            session_id,
            payload,
        })
    }

    fn endpoint_for(&self, mode: ChatMode) -> &str {
        match mode {
            ChatMode::Chat => &self.endpoints.chat_url,
            ChatMode::Research => &self.endpoints.research_url,
            ChatMode::Report => &self.endpoints.report_url,
        }
    }
}

#[async_trait]
impl ChatGateway for WebhookGateway {
    async fn send_chat(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<WebhookReply, WebhookError> {
        self.send(ChatMode::Chat, message, session_id).await
    }

    async fn send_research(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<WebhookReply, WebhookError> {
        self.send(ChatMode::Research, message, session_id).await
    }

    async fn send_report(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<WebhookReply, WebhookError> {
        self.send(ChatMode::Report, message, session_id).await
    }
}
