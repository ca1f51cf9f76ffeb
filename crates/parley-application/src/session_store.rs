//! Session store service.
//!
//! Owns the canonical in-memory session list and the active session id,
//! and mediates all reads and writes to durable storage.

use parley_core::id::IdGenerator;
use parley_core::session::{ChatMode, Message, Session, SessionRepository};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The canonical session collection.
///
/// The in-memory list is the state the UI renders from; the repository is
/// the durable backing. Storage failures are contained here: they are
/// logged and the last known in-memory state is preserved, so no storage
/// condition can crash the store or blank the sidebar.
///
/// The active session id is in-memory only; selecting a session has no
/// persistence side effect by itself.
pub struct SessionStore {
    repository: Arc<dyn SessionRepository>,
    ids: Arc<dyn IdGenerator>,
    /// Assistant greeting seeded into freshly created sessions.
    greeting: String,
    sessions: RwLock<Vec<Session>>,
    active_session_id: RwLock<Option<String>>,
}

impl SessionStore {
    /// Creates a new store over the given repository.
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        ids: Arc<dyn IdGenerator>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            ids,
            greeting: greeting.into(),
            sessions: RwLock::new(Vec::new()),
            active_session_id: RwLock::new(None),
        }
    }

    /// Reloads the in-memory list from durable storage.
    ///
    /// On read failure the prior in-memory list is kept and the condition
    /// is logged (non-fatal).
    pub async fn refresh(&self) {
        match self.repository.list_all().await {
            Ok(loaded) => {
                let mut sessions = self.sessions.write().await;
                *sessions = loaded;
            }
            Err(e) => {
                tracing::warn!(
                    "[SessionStore] Failed to load sessions, keeping last known list: {}",
                    e
                );
            }
        }
    }

    /// Returns the sessions visible to listings.
    ///
    /// A session is surfaced only once it contains at least one message
    /// authored by the user; greeting-only sessions stay hidden (but remain
    /// durably persisted beneath the surfaced view).
    pub async fn list_sessions(&self) -> Vec<Session> {
        self.refresh().await;
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .filter(|session| session.has_user_message())
            .cloned()
            .collect()
    }

    /// Updates the in-memory copy of a session without touching storage.
    ///
    /// Used for optimistic transcript updates (pending placeholders) that
    /// must be visible but never persisted.
    pub async fn stage_session(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        match sessions.iter_mut().find(|existing| existing.id == session.id) {
            Some(existing) => *existing = session,
            None => sessions.push(session),
        }
    }

    /// Merges a session by id and persists the full set.
    ///
    /// An existing session with the same id is overwritten entirely
    /// (last-writer-wins). Persistence failures are logged and leave the
    /// in-memory state intact; the return value reports whether the durable
    /// write went through.
    pub async fn upsert_session(&self, session: Session) -> bool {
        self.stage_session(session.clone()).await;

        match self.repository.save(&session).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "[SessionStore] Failed to persist session {}: {}",
                    session.id,
                    e
                );
                false
            }
        }
    }

    /// Removes one session. Missing ids are a no-op.
    ///
    /// Clears the active session id if it pointed at the deleted session.
    pub async fn delete_session(&self, session_id: &str) {
        {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|session| session.id != session_id);
        }

        if let Err(e) = self.repository.delete(session_id).await {
            tracing::warn!(
                "[SessionStore] Failed to delete session {}: {}",
                session_id,
                e
            );
        }

        let mut active = self.active_session_id.write().await;
        if active.as_deref() == Some(session_id) {
            *active = None;
        }
    }

    /// Empties durable storage, the in-memory list, and the active id.
    pub async fn clear_all(&self) {
        if let Err(e) = self.repository.clear().await {
            tracing::warn!("[SessionStore] Failed to clear session storage: {}", e);
        }

        let mut sessions = self.sessions.write().await;
        sessions.clear();
        drop(sessions);

        let mut active = self.active_session_id.write().await;
        *active = None;
    }

    /// Sets (or clears) the active session id. Pure state transition.
    pub async fn set_active_session(&self, session_id: Option<String>) {
        let mut active = self.active_session_id.write().await;
        *active = session_id;
    }

    /// Returns the active session id, if any.
    pub async fn active_session_id(&self) -> Option<String> {
        self.active_session_id.read().await.clone()
    }

    /// Finds a session by id, checking the in-memory list first.
    pub async fn find_session(&self, session_id: &str) -> Option<Session> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.iter().find(|s| s.id == session_id) {
                return Some(session.clone());
            }
        }

        match self.repository.find_by_id(session_id).await {
            Ok(found) => {
                if let Some(session) = found.clone() {
                    self.stage_session(session).await;
                }
                found
            }
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to look up session {}: {}", session_id, e);
                None
            }
        }
    }

    /// Creates a fresh session seeded with the assistant greeting and makes
    /// it active.
    ///
    /// The session is durably persisted right away but stays hidden from
    /// listings until the user replies.
    pub async fn new_session(&self, mode: ChatMode) -> Session {
        let now = chrono::Utc::now().to_rfc3339();
        let mut session = Session::new(self.ids.generate(), mode, now.clone());
        session
            .messages
            .push(Message::assistant(self.ids.generate(), self.greeting.clone(), now));

        self.upsert_session(session.clone()).await;
        self.set_active_session(Some(session.id.clone())).await;
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSessionRepository, MemorySessionRepository, SequentialIdGenerator};
    use parley_core::session::MessageRole;

    fn store_with(repository: Arc<dyn SessionRepository>) -> SessionStore {
        SessionStore::new(
            repository,
            Arc::new(SequentialIdGenerator::new("id")),
            "Hello! How can I help you today?",
        )
    }

    fn surfaced_session(id: &str) -> Session {
        let mut session = Session::new(id, ChatMode::Chat, "2024-01-01T00:00:00Z");
        session
            .messages
            .push(Message::user("m-1", "hi", "2024-01-01T00:00:00Z"));
        session
    }

    #[tokio::test]
    async fn test_new_session_is_hidden_until_user_replies() {
        let repository = Arc::new(MemorySessionRepository::new());
        let store = store_with(repository.clone());

        let mut session = store.new_session(ChatMode::Chat).await;

        // Greeting-only: persisted, but not surfaced
        assert_eq!(repository.list_all().await.unwrap().len(), 1);
        assert!(store.list_sessions().await.is_empty());
        assert_eq!(store.active_session_id().await, Some(session.id.clone()));
        assert_eq!(session.messages[0].role, MessageRole::Assistant);

        session
            .messages
            .push(Message::user("m-2", "hi", "2024-01-01T00:00:01Z"));
        store.upsert_session(session).await;

        assert_eq!(store.list_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_last_writer_wins() {
        let repository = Arc::new(MemorySessionRepository::new());
        let store = store_with(repository.clone());

        let mut session = surfaced_session("s-1");
        store.upsert_session(session.clone()).await;

        session.title = "Renamed".to_string();
        store.upsert_session(session).await;

        let listed = store.list_sessions().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Renamed");
    }

    #[tokio::test]
    async fn test_delete_session_is_idempotent_and_clears_active() {
        let repository = Arc::new(MemorySessionRepository::new());
        let store = store_with(repository.clone());

        store.upsert_session(surfaced_session("s-1")).await;
        store.set_active_session(Some("s-1".to_string())).await;

        store.delete_session("s-1").await;
        let after_first = store.list_sessions().await;
        assert!(after_first.is_empty());
        assert_eq!(store.active_session_id().await, None);

        // Deleting again produces the same final state
        store.delete_session("s-1").await;
        assert!(store.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_resets_everything() {
        let repository = Arc::new(MemorySessionRepository::new());
        let store = store_with(repository.clone());

        store.upsert_session(surfaced_session("s-1")).await;
        store.upsert_session(surfaced_session("s-2")).await;
        store.set_active_session(Some("s-2".to_string())).await;

        store.clear_all().await;

        assert!(store.list_sessions().await.is_empty());
        assert!(repository.list_all().await.unwrap().is_empty());
        assert_eq!(store.active_session_id().await, None);
    }

    #[tokio::test]
    async fn test_read_failure_returns_last_known_list() {
        let repository = Arc::new(FailingSessionRepository::new());
        repository.seed(surfaced_session("s-1")).await;

        let store = store_with(repository.clone());
        assert_eq!(store.list_sessions().await.len(), 1);

        // Storage starts failing; the last known list is served
        repository.fail_reads(true);
        assert_eq!(store.list_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stage_session_does_not_persist() {
        let repository = Arc::new(MemorySessionRepository::new());
        let store = store_with(repository.clone());

        store.stage_session(surfaced_session("s-1")).await;

        assert_eq!(store.list_sessions().await.len(), 0); // refresh drops unpersisted staging
        assert!(repository.list_all().await.unwrap().is_empty());
    }
}
