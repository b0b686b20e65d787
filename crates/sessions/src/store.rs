//! In-memory HTTP session store.
//!
//! Each session id maps to a `SessionEntry` holding string attributes and
//! access timestamps.  Sessions idle for longer than `max_inactive` are
//! invisible to every read and are swept by [`SessionStore::prune_expired`].
//! A zero `max_inactive` disables idle expiry.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use hs_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single live session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub attributes: HashMap<String, String>,
}

impl SessionEntry {
    fn is_expired_at(&self, max_inactive: Option<Duration>, now: DateTime<Utc>) -> bool {
        max_inactive.is_some_and(|max| now - self.last_accessed_at > max)
    }
}

/// Outcome of [`SessionStore::set_attribute_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeWrite {
    /// The key was unset and now holds the new value.
    Stored,
    /// The key already held this value; nothing was written.
    Existing(String),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionStore {
    /// `None` when sessions never expire from idleness.
    max_inactive: Option<Duration>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(max_inactive: std::time::Duration) -> Self {
        let max_inactive = (!max_inactive.is_zero())
            .then(|| Duration::from_std(max_inactive).unwrap_or_else(|_| Duration::days(365)));
        Self {
            max_inactive,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Mint a new, empty session.
    pub fn create(&self) -> SessionEntry {
        let now = Utc::now();
        let entry = SessionEntry {
            session_id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            last_accessed_at: now,
            attributes: HashMap::new(),
        };

        self.sessions
            .write()
            .insert(entry.session_id.clone(), entry.clone());
        entry
    }

    /// Look up a live session by id.
    pub fn get(&self, session_id: &str) -> Option<SessionEntry> {
        let now = Utc::now();
        self.sessions
            .read()
            .get(session_id)
            .filter(|e| !e.is_expired_at(self.max_inactive, now))
            .cloned()
    }

    /// Refresh the last-access timestamp.  Returns `false` if the session
    /// is gone or has already expired; an expired session is evicted on
    /// the spot instead of waiting for the next prune.
    pub fn touch(&self, session_id: &str) -> bool {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let Some(entry) = sessions.get_mut(session_id) else {
            return false;
        };
        if entry.is_expired_at(self.max_inactive, now) {
            sessions.remove(session_id);
            return false;
        }
        entry.last_accessed_at = now;
        true
    }

    pub fn get_attribute(&self, session_id: &str, key: &str) -> Option<String> {
        self.get(session_id)?.attributes.get(key).cloned()
    }

    /// Store `value` under `key` unless the key is already set.
    ///
    /// The check and the write happen under one write lock, so concurrent
    /// requests on the same session agree on a single winner.  Returns
    /// `None` when the session does not exist or has expired.
    pub fn set_attribute_if_absent(
        &self,
        session_id: &str,
        key: &str,
        value: &str,
    ) -> Option<AttributeWrite> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(session_id)
            .filter(|e| !e.is_expired_at(self.max_inactive, now))?;

        entry.last_accessed_at = now;
        if let Some(existing) = entry.attributes.get(key) {
            return Some(AttributeWrite::Existing(existing.clone()));
        }
        entry.attributes.insert(key.to_owned(), value.to_owned());
        Some(AttributeWrite::Stored)
    }

    /// Remove every session idle for longer than `max_inactive`.  Keeps
    /// everything when idle expiry is disabled.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now())
    }

    pub fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let Some(max_inactive) = self.max_inactive else {
            return 0;
        };
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            if entry.is_expired_at(Some(max_inactive), now) {
                TraceEvent::SessionExpired {
                    session_id: id.clone(),
                    idle_secs: (now - entry.last_accessed_at).num_seconds(),
                }
                .emit();
                false
            } else {
                true
            }
        });
        before - sessions.len()
    }

    /// Number of sessions held in memory, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
