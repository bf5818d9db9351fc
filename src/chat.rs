//! Conversation orchestration
//!
//! One chat turn: validate, filter, materialize the session, append the user
//! turn, ask the gateway for a completion, append the reply, audit. No
//! retries, no other states.

#[cfg(test)]
pub mod testing;

use crate::audit::{AuditRecord, AuditSink};
use crate::filter;
use crate::llm::{CompletionGateway, Role};
use crate::session::{HistoryEntry, SessionStore};
use std::sync::Arc;
use thiserror::Error;

/// Reply for messages outside the love/relationship domain.
pub const DECLINE_REPLY: &str =
    "Samahani, naweza kujibu maswali kuhusu mapenzi, mahusiano, hisia na mambo ya moyo tu ❤️.";

/// Reply substituted when the completion gateway fails. Persisted like any
/// other assistant turn so the conversation keeps flowing.
pub const FALLBACK_REPLY: &str = "Sorry, I could not generate a response.";

/// Per-turn failure surfaced to the HTTP layer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message required")]
    EmptyMessage,
}

/// Orchestrates chat turns over the session store, completion gateway and
/// audit sink.
pub struct ChatService {
    store: Arc<SessionStore>,
    gateway: Arc<dyn CompletionGateway>,
    audit: Arc<dyn AuditSink>,
}

impl ChatService {
    pub fn new(
        store: Arc<SessionStore>,
        gateway: Arc<dyn CompletionGateway>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            gateway,
            audit,
        }
    }

    /// Run one chat turn for `session_key` and return the reply text.
    pub async fn chat(&self, session_key: &str, message: &str) -> Result<String, ChatError> {
        let text = message.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        // Off-topic messages are invisible to session state: no transcript
        // mutation, no history entry, no audit record.
        if !filter::is_on_topic(text) {
            return Ok(DECLINE_REPLY.to_string());
        }

        let session = self.store.get_or_create(session_key).await;
        // Held across the gateway round trip: a second turn on the same
        // session must not read the transcript until this one has appended
        // its reply.
        let mut session = session.lock().await;

        session.append(Role::User, text);

        let reply = match self.gateway.complete(session.transcript()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    kind = ?e.kind,
                    error = %e,
                    "Completion failed, substituting fallback reply"
                );
                FALLBACK_REPLY.to_string()
            }
        };

        session.append(Role::Assistant, &reply);
        drop(session);

        if let Err(e) = self.audit.record(AuditRecord::now(text, &reply)) {
            tracing::warn!(error = %e, "Audit append failed");
        }

        Ok(reply)
    }

    /// Drop all state for the session. Always succeeds.
    pub async fn clear(&self, session_key: &str) {
        self.store.clear(session_key).await;
    }

    /// Display history for the session, empty if none exists.
    pub async fn history(&self, session_key: &str) -> Vec<HistoryEntry> {
        self.store.read_history(session_key).await
    }
}
