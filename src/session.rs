//! Per-session conversation state
//!
//! Each session owns two parallel views of one conversation: the transcript
//! replayed to the completion gateway, and the display history shown back to
//! the client. Appends happen in lockstep so the two views never drift:
//! `history.len() == transcript.len() - 1` for as long as the session exists
//! (the system seed turn has no display entry).

use crate::llm::{Role, Turn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Persona seed for every new transcript.
pub const PERSONA: &str = "You are a chatbot SPECIALIZED ONLY in love, relationships, heartbreak, \
    trust, emotions, and dating. If asked anything else, reply: \
    'Samahani, naweza kujibu maswali ya mapenzi tu.' \
    Always reply in the same language the user uses.";

/// Sender tag in the display history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One user-facing history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub text: String,
}

/// Conversation state for one session
#[derive(Debug)]
pub struct Session {
    transcript: Vec<Turn>,
    history: Vec<HistoryEntry>,
    last_active: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            transcript: vec![Turn::system(PERSONA)],
            history: Vec::new(),
            last_active: Instant::now(),
        }
    }

    /// Append a turn to the transcript and, for user/assistant roles, the
    /// paired display entry. The single `&mut` mutation keeps the two views
    /// in lockstep.
    pub fn append(&mut self, role: Role, content: &str) {
        self.transcript.push(Turn::new(role, content));
        let sender = match role {
            Role::User => Some(Sender::User),
            Role::Assistant => Some(Sender::Bot),
            Role::System => None,
        };
        if let Some(sender) = sender {
            self.history.push(HistoryEntry {
                sender,
                text: content.to_string(),
            });
        }
        self.last_active = Instant::now();
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

/// In-memory store of all live sessions, keyed by an opaque session key.
///
/// Lifecycle is owned here: sessions are created lazily on first use,
/// removed on explicit clear, and swept when idle past a TTL.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the session for `key`, creating and seeding it on first use.
    ///
    /// The returned handle's mutex is the per-session serialization point: a
    /// chat turn holds it across the full read-modify-write, including the
    /// gateway round trip, so concurrent turns on one session cannot
    /// interleave. Turns on different sessions proceed independently.
    pub async fn get_or_create(&self, key: &str) -> Arc<Mutex<Session>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(key) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Drop the session entirely. Succeeds whether or not it existed; the
    /// next `get_or_create` starts a fresh seed.
    pub async fn clear(&self, key: &str) {
        self.sessions.write().await.remove(key);
    }

    /// Current display history, or empty if the session does not exist.
    pub async fn read_history(&self, key: &str) -> Vec<HistoryEntry> {
        let handle = { self.sessions.read().await.get(key).cloned() };
        match handle {
            Some(session) => session.lock().await.history().to_vec(),
            None => Vec::new(),
        }
    }

    /// Drop sessions idle longer than `ttl`; returns how many were evicted.
    /// A session whose lock is held is mid-turn and always survives.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            session
                .try_lock()
                .map(|guard| guard.idle_for() < ttl)
                .unwrap_or(true)
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn first_use_seeds_persona() {
        let store = SessionStore::new();
        let session = store.get_or_create("a").await;
        let session = session.lock().await;

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].role, Role::System);
        assert_eq!(session.transcript()[0].content, PERSONA);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = SessionStore::new();
        {
            let session = store.get_or_create("a").await;
            session.lock().await.append(Role::User, "mapenzi");
        }
        let session = store.get_or_create("a").await;
        let session = session.lock().await;

        // Same session, not a fresh seed
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn append_keeps_views_in_lockstep() {
        let store = SessionStore::new();
        let handle = store.get_or_create("a").await;
        {
            let mut session = handle.lock().await;
            session.append(Role::User, "nina swali la mapenzi");
            session.append(Role::Assistant, "karibu, uliza");
        }

        let session = handle.lock().await;
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.history().len(), 2);
        assert_eq!(
            session.history()[0],
            HistoryEntry {
                sender: Sender::User,
                text: "nina swali la mapenzi".to_string()
            }
        );
        assert_eq!(session.history()[1].sender, Sender::Bot);
    }

    #[tokio::test]
    async fn clear_is_idempotent_and_reseeds() {
        let store = SessionStore::new();
        {
            let session = store.get_or_create("a").await;
            let mut session = session.lock().await;
            session.append(Role::User, "penzi");
            session.append(Role::Assistant, "ndiyo");
        }

        store.clear("a").await;
        store.clear("a").await;
        assert!(store.read_history("a").await.is_empty());

        let session = store.get_or_create("a").await;
        assert_eq!(session.lock().await.transcript().len(), 1);
    }

    #[tokio::test]
    async fn read_history_for_unknown_session_is_empty() {
        let store = SessionStore::new();
        assert!(store.read_history("nobody").await.is_empty());
        // Reading never materializes a session
        assert_eq!(store.evict_idle(Duration::ZERO).await, 0);
    }

    #[tokio::test]
    async fn evict_idle_respects_ttl_and_held_locks() {
        let store = SessionStore::new();
        store.get_or_create("idle").await;
        let busy = store.get_or_create("busy").await;
        let _guard = busy.lock().await;

        // Generous TTL keeps everything
        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);

        // Zero TTL evicts the idle session but not the one mid-turn
        assert_eq!(store.evict_idle(Duration::ZERO).await, 1);
        let sessions = store.sessions.read().await;
        assert!(sessions.contains_key("busy"));
        assert!(!sessions.contains_key("idle"));
    }

    proptest! {
        // Lockstep appends preserve the length invariant and the
        // user/bot alternation for any conversation shape.
        #[test]
        fn history_tracks_transcript(pairs in proptest::collection::vec((".{1,40}", ".{1,40}"), 0..16)) {
            let mut session = Session::new();
            for (user_text, reply) in &pairs {
                session.append(Role::User, user_text);
                session.append(Role::Assistant, reply);
            }

            prop_assert_eq!(session.history().len(), session.transcript().len() - 1);
            prop_assert_eq!(session.history().len(), pairs.len() * 2);
            for (i, entry) in session.history().iter().enumerate() {
                let expected = if i % 2 == 0 { Sender::User } else { Sender::Bot };
                prop_assert_eq!(entry.sender, expected);
            }
        }
    }
}
