//! JSON-based SessionRepository implementation.

use crate::dto::SessionRecord;
use crate::paths::ParleyPaths;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use parley_core::error::{ParleyError, Result};
use parley_core::session::{Session, SessionRepository};
use std::path::PathBuf;
use std::sync::Arc;

/// A repository implementation storing all sessions in a single JSON file.
///
/// The durable layout is one array document (`chat_sessions.json`): reads
/// load the whole array, and every mutating operation rewrites it wholesale.
/// There are no partial updates. Writes go through [`AtomicJsonFile`], so a
/// crashed write never corrupts the store.
pub struct JsonSessionRepository {
    file: Arc<AtomicJsonFile<Vec<SessionRecord>>>,
}

impl JsonSessionRepository {
    /// Creates a repository over the given store file.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path)),
        }
    }

    /// Creates a repository at the default location
    /// (`~/.local/share/parley/chat_sessions.json`).
    pub fn default_location() -> Result<Self> {
        let path = ParleyPaths::sessions_file()
            .map_err(|e| ParleyError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    /// Loads the full record set, treating a missing file as empty.
    fn load_records(file: &AtomicJsonFile<Vec<SessionRecord>>) -> Result<Vec<SessionRecord>> {
        Ok(file.load()?.unwrap_or_default())
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let file = self.file.clone();
        let session_id = session_id.to_string();

        tokio::task::spawn_blocking(move || {
            let records = Self::load_records(&file)?;
            Ok(records
                .into_iter()
                .find(|record| record.id == session_id)
                .map(SessionRecord::into_domain))
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let file = self.file.clone();
        let record = SessionRecord::from(session);

        tokio::task::spawn_blocking(move || {
            file.update(Vec::new(), |records| {
                match records.iter_mut().find(|existing| existing.id == record.id) {
                    Some(existing) => *existing = record.clone(),
                    None => records.push(record.clone()),
                }
                Ok(())
            })?;
            Ok(())
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let file = self.file.clone();
        let session_id = session_id.to_string();

        tokio::task::spawn_blocking(move || {
            file.update(Vec::new(), |records| {
                records.retain(|record| record.id != session_id);
                Ok(())
            })?;
            Ok(())
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn clear(&self) -> Result<()> {
        let file = self.file.clone();

        tokio::task::spawn_blocking(move || {
            file.save(&Vec::new())?;
            Ok(())
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let file = self.file.clone();

        tokio::task::spawn_blocking(move || {
            let records = Self::load_records(&file)?;
            Ok(records
                .into_iter()
                .map(SessionRecord::into_domain)
                .collect())
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::session::{ChatMode, Message};
    use tempfile::TempDir;

    fn create_test_session(id: &str) -> Session {
        let mut session = Session::new(id, ChatMode::Chat, "2024-01-01T00:00:00Z");
        session.title = format!("Test Session {}", id);
        session
            .messages
            .push(Message::user("m-1", "Hello", "2024-01-01T00:00:00Z"));
        session
            .messages
            .push(Message::assistant("m-2", "Hi there!", "2024-01-01T00:00:01Z"));
        session
    }

    fn repository_in(temp_dir: &TempDir) -> JsonSessionRepository {
        JsonSessionRepository::new(temp_dir.path().join("chat_sessions.json"))
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository_in(&temp_dir);

        let session = create_test_session("test-session-1");
        repository.save(&session).await.unwrap();

        let loaded = repository.find_by_id("test-session-1").await.unwrap();

        assert!(loaded.is_some());
        let loaded = loaded.unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.title, session.title);
        assert_eq!(loaded.messages, session.messages);
    }

    #[tokio::test]
    async fn test_save_overwrites_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository_in(&temp_dir);

        let mut session = create_test_session("session-1");
        repository.save(&session).await.unwrap();

        session.title = "Renamed".to_string();
        repository.save(&session).await.unwrap();

        let all = repository.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Renamed");
    }

    #[tokio::test]
    async fn test_list_all() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository_in(&temp_dir);

        repository.save(&create_test_session("session-1")).await.unwrap();
        repository.save(&create_test_session("session-2")).await.unwrap();
        repository.save(&create_test_session("session-3")).await.unwrap();

        let sessions = repository.list_all().await.unwrap();
        assert_eq!(sessions.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository_in(&temp_dir);

        let session = create_test_session("session-to-delete");
        repository.save(&session).await.unwrap();

        repository.delete("session-to-delete").await.unwrap();
        assert!(repository.find_by_id("session-to-delete").await.unwrap().is_none());

        // Second delete of the same id is a no-op
        repository.delete("session-to-delete").await.unwrap();
        assert!(repository.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository_in(&temp_dir);

        repository.save(&create_test_session("session-1")).await.unwrap();
        repository.save(&create_test_session("session-2")).await.unwrap();

        repository.clear().await.unwrap();

        assert!(repository.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_file_uses_camel_case_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chat_sessions.json");
        let repository = JsonSessionRepository::new(path.clone());

        repository.save(&create_test_session("session-1")).await.unwrap();

        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.trim_start().starts_with('['));
        assert!(raw.contains("\"createdAt\""));
    }
}
