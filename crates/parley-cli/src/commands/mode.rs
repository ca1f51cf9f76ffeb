//! The `mode` command: toggle the chat mode on a session.

use super::App;
use anyhow::{Result, anyhow};
use parley_core::session::ChatMode;

pub async fn run(app: &App, mode: &str, session_id: &str) -> Result<()> {
    let requested: ChatMode = mode.parse().map_err(|e: String| anyhow!(e))?;

    if app.store.find_session(session_id).await.is_none() {
        return Err(anyhow!("No session with id '{session_id}'"));
    }

    app.store
        .set_active_session(Some(session_id.to_string()))
        .await;
    app.selector.sync_with_active_session().await;

    match app.selector.toggle_mode(requested).await {
        Ok(mode) => {
            println!("Chat mode is now '{mode}'.");
            Ok(())
        }
        // The warning callback has already surfaced the rejection
        Err(e) if e.is_user_rejection() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
