//! HTTP API for Moyo

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::audit::AuditSink;
use crate::chat::ChatService;
use crate::llm::CompletionGateway;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(
        store: Arc<SessionStore>,
        gateway: Arc<dyn CompletionGateway>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            chat: Arc::new(ChatService::new(store, gateway, audit)),
        }
    }
}
