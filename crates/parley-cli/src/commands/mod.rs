//! CLI command handlers and the composition root.

pub mod mode;
pub mod send;
pub mod sessions;

use anyhow::Result;
use parley_application::{ConversationService, ModeSelector, SessionStore, WarningCallback};
use parley_core::id::{IdGenerator, UuidIdGenerator};
use parley_core::session::SessionRepository;
use parley_infrastructure::{ConfigService, JsonSessionRepository};
use parley_interaction::{ChatGateway, WebhookGateway};
use std::sync::Arc;

/// The wired application services.
pub struct App {
    pub store: Arc<SessionStore>,
    pub conversation: Arc<ConversationService>,
    pub selector: Arc<ModeSelector>,
}

/// Composition root: constructs the concrete repositories and services once
/// and wires them together.
pub async fn bootstrap() -> Result<App> {
    let config_service = ConfigService::new();
    let config = config_service.get_config();

    let ids: Arc<dyn IdGenerator> = Arc::new(UuidIdGenerator);
    let repository: Arc<dyn SessionRepository> =
        Arc::new(JsonSessionRepository::default_location()?);
    let store = Arc::new(SessionStore::new(
        repository,
        ids.clone(),
        config.greeting.clone(),
    ));
    let gateway: Arc<dyn ChatGateway> =
        Arc::new(WebhookGateway::from_config(&config.webhooks, ids.clone()));
    let conversation = Arc::new(ConversationService::new(store.clone(), gateway, ids));
    let selector = Arc::new(ModeSelector::new(store.clone()));

    let warn: WarningCallback = Arc::new(|title, body| eprintln!("[warning] {title}: {body}"));
    conversation.set_warning_callback(warn.clone()).await;
    selector.set_warning_callback(warn).await;

    Ok(App {
        store,
        conversation,
        selector,
    })
}
