//! Mode selector.
//!
//! Tracks which conversational mode applies to the active session and
//! enforces mode immutability once a conversation has progressed.

use crate::conversation::WarningCallback;
use crate::session_store::SessionStore;
use parley_core::error::{ParleyError, Result};
use parley_core::session::ChatMode;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Warning title surfaced when a locked mode change is rejected.
pub const MODE_LOCKED_TITLE: &str = "Cannot Change Chat Mode";
/// Warning body surfaced when a locked mode change is rejected.
pub const MODE_LOCKED_BODY: &str =
    "This conversation has already started. Create a new chat session to use a different mode.";

/// Per-session mode toggle with a lock once the conversation has started.
///
/// Selecting the engaged mode again clears it back to plain chat. The
/// displayed mode is re-derived from the active session's stored mode
/// whenever the active session changes.
pub struct ModeSelector {
    store: Arc<SessionStore>,
    displayed: RwLock<ChatMode>,
    warning_callback: RwLock<Option<WarningCallback>>,
}

impl ModeSelector {
    /// Creates a selector over the given store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            displayed: RwLock::new(ChatMode::default()),
            warning_callback: RwLock::new(None),
        }
    }

    /// Sets a callback to be invoked for user-facing warnings.
    pub async fn set_warning_callback(&self, callback: WarningCallback) {
        *self.warning_callback.write().await = Some(callback);
    }

    /// The mode currently displayed for the active session.
    pub async fn current_mode(&self) -> ChatMode {
        *self.displayed.read().await
    }

    /// Toggles the requested mode on the active session.
    ///
    /// Selecting the engaged mode again clears it to plain chat. The change
    /// is rejected with [`ParleyError::ModeLocked`] when the session has
    /// progressed past one message and a different non-plain mode is
    /// engaged; clearing the engaged mode stays allowed.
    pub async fn toggle_mode(&self, requested: ChatMode) -> Result<ChatMode> {
        let active_id = self.store.active_session_id().await;
        let session = match active_id {
            Some(id) => self.store.find_session(&id).await,
            None => None,
        };

        let Some(mut session) = session else {
            // No active session yet: the toggle only affects what the next
            // session will be created with.
            let mut displayed = self.displayed.write().await;
            let new_mode = if *displayed == requested {
                ChatMode::Chat
            } else {
                requested
            };
            *displayed = new_mode;
            return Ok(new_mode);
        };

        if session.mode_locked() && !session.mode.is_plain() && session.mode != requested {
            self.notify(MODE_LOCKED_TITLE, MODE_LOCKED_BODY).await;
            return Err(ParleyError::ModeLocked {
                active: session.mode,
                requested,
            });
        }

        let new_mode = if session.mode == requested {
            ChatMode::Chat
        } else {
            requested
        };
        session.mode = new_mode;
        self.store.upsert_session(session).await;

        *self.displayed.write().await = new_mode;
        Ok(new_mode)
    }

    /// Re-derives the displayed mode from the active session.
    ///
    /// Must be called whenever the active session changes; defaults to
    /// plain chat when there is none.
    pub async fn sync_with_active_session(&self) {
        let mode = match self.store.active_session_id().await {
            Some(id) => self
                .store
                .find_session(&id)
                .await
                .map(|session| session.mode)
                .unwrap_or_default(),
            None => ChatMode::default(),
        };
        *self.displayed.write().await = mode;
    }

    async fn notify(&self, title: &str, body: &str) {
        if let Some(callback) = self.warning_callback.read().await.as_ref() {
            callback(title, body);
        }
    }
}
