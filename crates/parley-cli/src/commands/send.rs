//! The `send` command: one full message exchange.

use super::App;
use anyhow::{Result, anyhow};
use parley_application::SendOutcome;
use parley_core::session::{ChatMode, MessageRole};

pub async fn run(app: &App, message: &str, session_id: Option<&str>, mode: &str) -> Result<()> {
    let session = match session_id {
        Some(id) => app
            .store
            .find_session(id)
            .await
            .ok_or_else(|| anyhow!("No session with id '{id}'"))?,
        None => {
            let mode: ChatMode = mode.parse().map_err(|e: String| anyhow!(e))?;
            let session = app.store.new_session(mode).await;
            println!("Started new {} session {}", session.mode, session.id);
            session
        }
    };

    app.store.set_active_session(Some(session.id.clone())).await;
    app.selector.sync_with_active_session().await;

    let outcome = app.conversation.send_message(&session.id, message).await;

    match outcome {
        Ok(SendOutcome::Settled { session, .. } | SendOutcome::Fallback { session }) => {
            for message in session.messages.iter().rev().take(2).rev() {
                let speaker = match message.role {
                    MessageRole::User => "you",
                    MessageRole::Assistant => "assistant",
                };
                println!("{speaker}: {}", message.content);
            }
            Ok(())
        }
        Ok(SendOutcome::Discarded) => {
            println!("Session was deleted while sending; reply discarded.");
            Ok(())
        }
        Err(e) if e.is_user_rejection() => {
            eprintln!("[warning] {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
