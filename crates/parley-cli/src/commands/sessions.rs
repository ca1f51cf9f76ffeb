//! The `sessions` subcommands: the sidebar intents.

use super::App;

pub async fn list(app: &App) {
    let sessions = app.store.list_sessions().await;
    if sessions.is_empty() {
        println!("No sessions yet.");
        return;
    }

    for session in sessions {
        println!(
            "{}  [{}] {} - {}",
            session.id, session.mode, session.title, session.preview
        );
    }
}

pub async fn delete(app: &App, id: &str) {
    app.store.delete_session(id).await;
    println!("Deleted session {id} (if it existed).");
}

pub async fn clear(app: &App) {
    app.store.clear_all().await;
    println!("Cleared all sessions.");
}
