//! Conversation controller.
//!
//! The per-send state machine: optimistic transcript updates, the webhook
//! round trip, placeholder resolution, and failure fallback.

use crate::session_store::SessionStore;
use parley_core::error::{ParleyError, Result};
use parley_core::id::IdGenerator;
use parley_core::session::{ChatMode, Message, Session};
use parley_interaction::{ChatGateway, extract_reply};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Assistant text appended when the webhook round trip fails.
pub const CONNECTION_FALLBACK_REPLY: &str = "I'm having trouble connecting to the server right now. This is a simulated response - please try again later.";

/// Callback for surfacing user-facing warnings (title, body).
///
/// This is how non-fatal conditions reach the UI layer without the
/// application crates knowing anything about rendering.
pub type WarningCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// How a send settled.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The webhook answered and the reply was applied.
    Settled { session: Session, reply: String },
    /// The webhook failed; the fallback reply was applied.
    Fallback { session: Session },
    /// The originating session was deleted while the call was in flight;
    /// the late reply was discarded.
    Discarded,
}

/// Orchestrates a message send from user input to settled transcript.
///
/// States: Idle -> Sending -> {Settled, Failed} -> Idle. Only one send may
/// be in flight per session; a second attempt is rejected, not queued. The
/// in-flight flag is released on every exit path by an RAII guard.
pub struct ConversationService {
    store: Arc<SessionStore>,
    gateway: Arc<dyn ChatGateway>,
    ids: Arc<dyn IdGenerator>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    warning_callback: RwLock<Option<WarningCallback>>,
}

impl ConversationService {
    /// Creates a new controller over the given collaborators.
    pub fn new(
        store: Arc<SessionStore>,
        gateway: Arc<dyn ChatGateway>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            gateway,
            ids,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            warning_callback: RwLock::new(None),
        }
    }

    /// Sets a callback to be invoked for user-facing warnings.
    pub async fn set_warning_callback(&self, callback: WarningCallback) {
        *self.warning_callback.write().await = Some(callback);
    }

    /// Whether a send is currently in flight for the given session.
    pub fn is_sending(&self, session_id: &str) -> bool {
        self.in_flight.lock().unwrap().contains(session_id)
    }

    /// Sends a user message through the session's webhook endpoint.
    ///
    /// The user message and a pending placeholder become visible
    /// immediately; the placeholder is always resolved or discarded before
    /// anything is persisted. On the session's first user exchange the
    /// session is persisted (title derived from the input, preview set to
    /// the raw input) before the remote call is awaited.
    ///
    /// # Errors
    ///
    /// - [`ParleyError::EmptyMessage`]: input was empty after trimming
    /// - [`ParleyError::SendInFlight`]: a send is already running for this session
    /// - [`ParleyError::NotFound`]: the session does not exist
    ///
    /// Webhook failures are not errors at this boundary; they settle as
    /// [`SendOutcome::Fallback`].
    pub async fn send_message(&self, session_id: &str, input: &str) -> Result<SendOutcome> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParleyError::EmptyMessage);
        }

        let _guard = self.begin_send(session_id)?;

        let mut session = self
            .store
            .find_session(session_id)
            .await
            .ok_or_else(|| ParleyError::not_found("Session", session_id))?;

        let first_exchange = !session.has_user_message();
        let now = chrono::Utc::now().to_rfc3339();
        session
            .messages
            .push(Message::user(self.ids.generate(), input, now.clone()));

        let mut session_initialized = !first_exchange;
        if first_exchange {
            session.title = Session::derive_title(input);
            session.preview = input.to_string();
            // Persist the user's opening message before awaiting the call
            session_initialized = self.store.upsert_session(session.clone()).await;
        }

        // Optimistic placeholder: visible right away, never persisted
        session
            .messages
            .push(Message::pending(self.ids.generate(), now));
        self.store.stage_session(session.clone()).await;

        let result = match session.mode {
            ChatMode::Chat => self.gateway.send_chat(input, Some(session_id)).await,
            ChatMode::Research => self.gateway.send_research(input, Some(session_id)).await,
            ChatMode::Report => self.gateway.send_report(input, Some(session_id)).await,
        };

        // The session may have been deleted while the call was in flight;
        // a late reply settles into its originating session or nowhere.
        let Some(mut settled) = self.store.find_session(session_id).await else {
            tracing::debug!(
                "[ConversationService] Discarding late reply for deleted session {}",
                session_id
            );
            return Ok(SendOutcome::Discarded);
        };
        settled.messages.retain(|message| !message.is_pending());

        let settled_at = chrono::Utc::now().to_rfc3339();
        match result {
            Ok(reply) => {
                let text = extract_reply(&reply.payload);
                settled
                    .messages
                    .push(Message::assistant(self.ids.generate(), text.clone(), settled_at));
                settled.preview = text.clone();
                self.store.upsert_session(settled.clone()).await;
                Ok(SendOutcome::Settled {
                    session: settled,
                    reply: text,
                })
            }
            Err(err) => {
                tracing::error!(
                    "[ConversationService] Webhook call failed for session {}: {}",
                    session_id,
                    err
                );
                settled.messages.push(Message::assistant(
                    self.ids.generate(),
                    CONNECTION_FALLBACK_REPLY,
                    settled_at,
                ));
                if session_initialized {
                    self.store.upsert_session(settled.clone()).await;
                } else {
                    self.store.stage_session(settled.clone()).await;
                }
                self.notify(
                    "Connection Error",
                    "Could not reach the assistant service. A fallback reply was added to the conversation.",
                )
                .await;
                Ok(SendOutcome::Fallback { session: settled })
            }
        }
    }

    /// Marks a session as sending, rejecting overlap.
    fn begin_send(&self, session_id: &str) -> Result<InFlightGuard> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(session_id.to_string()) {
            return Err(ParleyError::SendInFlight {
                session_id: session_id.to_string(),
            });
        }
        Ok(InFlightGuard {
            in_flight: self.in_flight.clone(),
            session_id: session_id.to_string(),
        })
    }

    async fn notify(&self, title: &str, body: &str) {
        if let Some(callback) = self.warning_callback.read().await.as_ref() {
            callback(title, body);
        }
    }
}

/// Releases the per-session in-flight flag on drop, whatever the exit path.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().unwrap().remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySessionRepository, ScriptedGateway, SequentialIdGenerator};
    use parley_core::session::{MessageRole, SessionRepository};
    use parley_interaction::{FALLBACK_REPLY, WebhookError};
    use serde_json::json;
    use tokio::sync::Notify;

    struct Harness {
        repository: Arc<MemorySessionRepository>,
        store: Arc<SessionStore>,
        gateway: Arc<ScriptedGateway>,
        service: Arc<ConversationService>,
    }

    fn harness() -> Harness {
        let repository = Arc::new(MemorySessionRepository::new());
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::new("id"));
        let store = Arc::new(SessionStore::new(
            repository.clone(),
            ids.clone(),
            "Hello! How can I help you today?",
        ));
        let gateway = Arc::new(ScriptedGateway::new());
        let service = Arc::new(ConversationService::new(
            store.clone(),
            gateway.clone(),
            ids,
        ));
        Harness {
            repository,
            store,
            gateway,
            service,
        }
    }

    async fn bare_session(store: &SessionStore, id: &str, mode: ChatMode) -> Session {
        let session = Session::new(id, mode, "2024-01-01T00:00:00Z");
        store.upsert_session(session.clone()).await;
        session
    }

    #[tokio::test]
    async fn test_first_exchange_settles_title_preview_and_transcript() {
        let h = harness();
        bare_session(&h.store, "s-1", ChatMode::Chat).await;
        h.gateway.push_ok(json!({"message": {"content": "hi there"}}));

        let outcome = h.service.send_message("s-1", "hello").await.unwrap();

        let SendOutcome::Settled { session, reply } = outcome else {
            panic!("expected settled outcome");
        };
        assert_eq!(reply, "hi there");
        assert_eq!(session.title, "hello");
        assert_eq!(session.preview, "hi there");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, MessageRole::User);
        assert_eq!(session.messages[0].content, "hello");
        assert_eq!(session.messages[1].role, MessageRole::Assistant);
        assert_eq!(session.messages[1].content, "hi there");

        // Persisted state matches and holds no placeholder
        let stored = h.repository.find_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(stored.messages, session.messages);
        assert!(!stored.has_pending_message());

        // Ids come from the injected generator: user, placeholder, assistant
        assert_eq!(session.messages[0].id, "id-1");
        assert_eq!(session.messages[1].id, "id-3");
    }

    #[tokio::test]
    async fn test_long_input_title_is_truncated() {
        let h = harness();
        bare_session(&h.store, "s-1", ChatMode::Chat).await;
        h.gateway.push_ok(json!({"reply": "ok"}));

        let input = "x".repeat(40);
        h.service.send_message("s-1", &input).await.unwrap();

        let stored = h.repository.find_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(stored.title, format!("{}...", "x".repeat(30)));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_synchronously() {
        let h = harness();
        bare_session(&h.store, "s-1", ChatMode::Chat).await;

        let result = h.service.send_message("s-1", "   ").await;

        assert!(matches!(result, Err(ParleyError::EmptyMessage)));
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let h = harness();
        let result = h.service.send_message("missing", "hello").await;
        assert!(matches!(result, Err(ParleyError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failure_appends_fallback_and_fires_warning() {
        let h = harness();
        bare_session(&h.store, "s-1", ChatMode::Chat).await;
        h.gateway.push_err(WebhookError::Transport {
            message: "connection refused".to_string(),
            is_retryable: true,
        });

        let warnings: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = warnings.clone();
        h.service
            .set_warning_callback(Arc::new(move |title, _body| {
                sink.lock().unwrap().push(title.to_string());
            }))
            .await;

        let outcome = h.service.send_message("s-1", "hello").await.unwrap();

        let SendOutcome::Fallback { session } = outcome else {
            panic!("expected fallback outcome");
        };
        let last = session.messages.last().unwrap();
        assert_eq!(last.content, CONNECTION_FALLBACK_REPLY);
        assert!(!session.has_pending_message());

        // Persisted because the session was initialized before the call
        let stored = h.repository.find_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(stored.messages.last().unwrap().content, CONNECTION_FALLBACK_REPLY);
        assert!(!stored.has_pending_message());

        assert_eq!(warnings.lock().unwrap().as_slice(), ["Connection Error"]);
    }

    #[tokio::test]
    async fn test_unrecognized_payload_settles_with_extractor_fallback() {
        let h = harness();
        bare_session(&h.store, "s-1", ChatMode::Chat).await;
        h.gateway.push_ok(json!({"message": "Workflow was started"}));

        let outcome = h.service.send_message("s-1", "hello").await.unwrap();

        let SendOutcome::Settled { reply, .. } = outcome else {
            panic!("expected settled outcome");
        };
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_mode_routes_to_matching_endpoint() {
        let h = harness();
        bare_session(&h.store, "s-research", ChatMode::Research).await;
        bare_session(&h.store, "s-report", ChatMode::Report).await;
        h.gateway.push_ok(json!({"output": "a"}));
        h.gateway.push_ok(json!({"output": "b"}));

        h.service.send_message("s-research", "dig in").await.unwrap();
        h.service.send_message("s-report", "write up").await.unwrap();

        let calls = h.gateway.calls();
        assert_eq!(calls[0].mode, ChatMode::Research);
        assert_eq!(calls[1].mode, ChatMode::Report);
        assert_eq!(calls[0].session_id.as_deref(), Some("s-research"));
    }

    #[tokio::test]
    async fn test_second_send_is_rejected_while_first_is_in_flight() {
        let h = harness();
        bare_session(&h.store, "s-1", ChatMode::Chat).await;

        let gate = Arc::new(Notify::new());
        h.gateway.hold_until(gate.clone());
        h.gateway.push_ok(json!({"reply": "done"}));

        let service = h.service.clone();
        let pending = tokio::spawn(async move { service.send_message("s-1", "first").await });

        // Wait until the optimistic placeholder is staged, which puts the
        // first send at or past the gateway call
        loop {
            let staged = h.store.find_session("s-1").await.unwrap();
            if staged.has_pending_message() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(h.service.is_sending("s-1"));

        let overlap = h.service.send_message("s-1", "second").await;
        assert!(matches!(overlap, Err(ParleyError::SendInFlight { .. })));

        gate.notify_one();
        let outcome = pending.await.unwrap().unwrap();
        assert!(matches!(outcome, SendOutcome::Settled { .. }));

        // Flag released after settle
        assert!(!h.service.is_sending("s-1"));
    }

    #[tokio::test]
    async fn test_late_reply_for_deleted_session_is_discarded() {
        let h = harness();
        bare_session(&h.store, "s-1", ChatMode::Chat).await;

        let gate = Arc::new(Notify::new());
        h.gateway.hold_until(gate.clone());
        h.gateway.push_ok(json!({"reply": "too late"}));

        let service = h.service.clone();
        let pending = tokio::spawn(async move { service.send_message("s-1", "hello").await });

        loop {
            match h.store.find_session("s-1").await {
                Some(staged) if staged.has_pending_message() => break,
                _ => tokio::task::yield_now().await,
            }
        }

        h.store.delete_session("s-1").await;
        gate.notify_one();

        let outcome = pending.await.unwrap().unwrap();
        assert!(matches!(outcome, SendOutcome::Discarded));
        assert!(h.repository.find_by_id("s-1").await.unwrap().is_none());
    }
}
