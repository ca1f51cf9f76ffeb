//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// This trait defines the contract for persisting and retrieving sessions,
/// decoupling the application's core logic from the specific storage
/// mechanism. The file-backed implementation rewrites the whole session set
/// on every mutation; a relational backend (sessions and messages tables,
/// cascading delete) can implement the same row-shaped contract.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Saves a session to storage.
    ///
    /// Merges by id: an existing session with the same id is overwritten
    /// entirely (last-writer-wins, no field-level merge).
    async fn save(&self, session: &Session) -> Result<()>;

    /// Deletes a session from storage.
    ///
    /// Deleting a session that does not exist is a no-op.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Removes every stored session.
    async fn clear(&self) -> Result<()>;

    /// Lists all stored sessions, hidden ones included.
    ///
    /// Visibility filtering is a caller concern; the repository returns the
    /// full durable set.
    async fn list_all(&self) -> Result<Vec<Session>>;
}
