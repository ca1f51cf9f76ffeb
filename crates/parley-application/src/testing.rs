//! Shared test doubles for the application services.

use async_trait::async_trait;
use parley_core::error::{ParleyError, Result};
use parley_core::id::IdGenerator;
use parley_core::session::{ChatMode, Session, SessionRepository};
use parley_interaction::{ChatGateway, WebhookError, WebhookReply};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Id generator producing `prefix-1`, `prefix-2`, ...
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicUsize,
}

impl SequentialIdGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: AtomicUsize::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

/// In-memory SessionRepository.
pub struct MemorySessionRepository {
    sessions: Mutex<Vec<Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => sessions.push(session.clone()),
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|s| s.id != session_id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.sessions.lock().unwrap().clear();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        Ok(self.sessions.lock().unwrap().clone())
    }
}

/// In-memory repository whose reads can be made to fail on demand.
pub struct FailingSessionRepository {
    inner: MemorySessionRepository,
    fail_reads: AtomicBool,
}

impl FailingSessionRepository {
    pub fn new() -> Self {
        Self {
            inner: MemorySessionRepository::new(),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub async fn seed(&self, session: Session) {
        self.inner.save(&session).await.unwrap();
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(ParleyError::data_access("simulated storage read failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionRepository for FailingSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        self.check_reads()?;
        self.inner.find_by_id(session_id).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.inner.save(session).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.inner.delete(session_id).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        self.check_reads()?;
        self.inner.list_all().await
    }
}

/// One recorded gateway call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub mode: ChatMode,
    pub message: String,
    pub session_id: Option<String>,
}

/// Scripted ChatGateway: answers from a queue, records every call, and can
/// park callers on a gate to simulate slow endpoints.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<std::result::Result<Value, WebhookError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    pub fn push_ok(&self, payload: Value) {
        self.responses.lock().unwrap().push_back(Ok(payload));
    }

    pub fn push_err(&self, err: WebhookError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Parks the next calls until the notify is signalled.
    pub fn hold_until(&self, gate: Arc<Notify>) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(
        &self,
        mode: ChatMode,
        message: &str,
        session_id: Option<&str>,
    ) -> std::result::Result<WebhookReply, WebhookError> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.calls.lock().unwrap().push(RecordedCall {
            mode,
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
        });

        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Value::Null));
        next.map(|payload| WebhookReply {
            session_id: session_id.unwrap_or("generated").to_string(),
            payload,
        })
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    async fn send_chat(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> std::result::Result<WebhookReply, WebhookError> {
        self.respond(ChatMode::Chat, message, session_id).await
    }

    async fn send_research(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> std::result::Result<WebhookReply, WebhookError> {
        self.respond(ChatMode::Research, message, session_id).await
    }

    async fn send_report(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> std::result::Result<WebhookReply, WebhookError> {
        self.respond(ChatMode::Report, message, session_id).await
    }
}
