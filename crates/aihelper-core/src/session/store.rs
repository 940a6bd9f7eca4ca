//! In-memory chat session store with per-key locking.
//!
//! The outer map lock is only held long enough to find or create a session
//! slot. Each slot has its own async mutex, which a chat call holds for its
//! whole read-dispatch-write cycle, so calls on the same key run one at a
//! time while calls on different keys proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use crate::types::{ChatHistory, ChatMessage};

// ─────────────────────────────────────────────
// Truncation
// ─────────────────────────────────────────────

/// Evict the oldest messages until `history` holds at most `max_len` entries.
///
/// A system message at index 0 is pinned while `max_len >= 2`; with a cap of
/// one only the newest message survives.
pub fn truncate_history(history: &mut ChatHistory, max_len: usize) {
    let max_len = max_len.max(1);
    if history.len() <= max_len {
        return;
    }

    let excess = history.len() - max_len;
    let pinned = max_len >= 2 && history.first().is_some_and(ChatMessage::is_system);
    let start = usize::from(pinned);
    history.drain(start..start + excess);
}

// ─────────────────────────────────────────────
// ChatSessionStore
// ─────────────────────────────────────────────

type Slot = Arc<Mutex<ChatHistory>>;

/// Maps session keys to bounded chat histories.
///
/// Sessions live as long as the store; nothing expires and nothing is
/// written to disk.
#[derive(Debug)]
pub struct ChatSessionStore {
    max_history: usize,
    sessions: RwLock<HashMap<String, Slot>>,
}

impl ChatSessionStore {
    /// Create a store whose sessions hold at most `max_history` messages.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Per-session message cap.
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Find the slot for `key`, creating an empty one on first use.
    async fn slot(&self, key: &str) -> Slot {
        {
            let sessions = self.sessions.read().await;
            if let Some(slot) = sessions.get(key) {
                return Arc::clone(slot);
            }
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(key.to_string()).or_default())
    }

    /// Take exclusive access to one session until the returned lock is dropped.
    pub async fn lock(&self, key: &str) -> SessionLock {
        self.lock_with_limit(key, self.max_history).await
    }

    /// Like [`lock`](Self::lock), but staging and commit cap the history at
    /// `max_history` instead of the store-wide default.
    ///
    /// Clients sharing one store pass their own configured cap here.
    pub async fn lock_with_limit(&self, key: &str, max_history: usize) -> SessionLock {
        let guard = self.slot(key).await.lock_owned().await;
        SessionLock {
            key: key.to_string(),
            max_history: max_history.max(1),
            guard,
        }
    }

    /// Snapshot of a session's history (empty if the key was never used).
    pub async fn get(&self, key: &str) -> ChatHistory {
        let slot = {
            let sessions = self.sessions.read().await;
            match sessions.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return Vec::new(),
            }
        };
        let history = slot.lock().await;
        history.clone()
    }

    /// Append one message and return the post-truncation history.
    pub async fn append(&self, key: &str, message: ChatMessage) -> ChatHistory {
        let session = self.lock(key).await;
        let history = session.staged([message]);
        session.commit(history.clone());
        history
    }

    /// Reset one conversation. Returns `true` if the session existed.
    pub async fn clear(&self, key: &str) -> bool {
        let slot = {
            let sessions = self.sessions.read().await;
            match sessions.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return false,
            }
        };
        slot.lock().await.clear();
        debug!(session = key, "cleared chat session");
        true
    }

    /// Number of sessions seen so far.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// All session keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

// ─────────────────────────────────────────────
// SessionLock
// ─────────────────────────────────────────────

/// Exclusive handle on one session's history.
///
/// Changes are made on a staged copy and only land in the store through
/// [`SessionLock::commit`]. Dropping the lock without committing leaves the
/// history exactly as it was.
#[derive(Debug)]
pub struct SessionLock {
    key: String,
    max_history: usize,
    guard: OwnedMutexGuard<ChatHistory>,
}

impl SessionLock {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cap applied by [`staged`](Self::staged) and [`commit`](Self::commit).
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Whether this session has no committed messages yet.
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Copy of the history with `messages` appended and the cap applied.
    pub fn staged(&self, messages: impl IntoIterator<Item = ChatMessage>) -> ChatHistory {
        let mut history = self.guard.clone();
        history.extend(messages);
        truncate_history(&mut history, self.max_history);
        history
    }

    /// Replace the committed history (the cap is re-applied) and release the lock.
    pub fn commit(mut self, mut history: ChatHistory) {
        truncate_history(&mut history, self.max_history);
        debug!(session = %self.key, messages = history.len(), "committed chat history");
        *self.guard = history;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
