//! Session-scoped drafts.
//!
//! Each browser gets a random [`SessionId`] cookie. The questionnaire answers
//! for that session live in a [`DraftStore`] until they are merged into a
//! record or the session goes idle for longer than the configured timeout.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::record::Draft;

/// Opaque identifier carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug)]
struct Entry {
    draft: Draft,
    touched: Instant,
}

/// In-memory table of drafts keyed by session.
#[derive(Debug)]
pub struct DraftStore {
    entries: Mutex<HashMap<SessionId, Entry>>,
    idle_timeout: Duration,
}

impl DraftStore {
    /// Create an empty store whose drafts expire after `idle_timeout`
    /// without access.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Store `draft` as the session's current draft, replacing any
    /// unmerged one.
    pub fn put(&self, session: SessionId, draft: Draft) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_locked(&mut entries, now, self.idle_timeout);
        entries.insert(
            session,
            Entry {
                draft,
                touched: now,
            },
        );
        trace!("Stored draft for session {session}");
    }

    /// Get a copy of the session's current draft.
    ///
    /// The draft stays in place, so a rejected upload can be retried
    /// without repeating the questionnaire. An expired draft is dropped and
    /// reported as absent.
    #[must_use]
    pub fn get(&self, session: SessionId) -> Option<Draft> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(&session)?;
        if now.duration_since(entry.touched) <= self.idle_timeout {
            entry.touched = now;
            return Some(entry.draft.clone());
        }

        entries.remove(&session);
        debug!("Draft for session {session} expired");
        None
    }

    /// Drop the session's draft once it has been merged.
    pub fn clear(&self, session: SessionId) {
        self.entries.lock().remove(&session);
    }

    /// Drop every draft idle longer than the timeout.
    ///
    /// Returns the number of drafts removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        Self::purge_locked(&mut entries, Instant::now(), self.idle_timeout)
    }

    /// Number of drafts held, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check whether no drafts are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_locked(
        entries: &mut HashMap<SessionId, Entry>,
        now: Instant,
        idle_timeout: Duration,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.touched) <= idle_timeout);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft(style: &str) -> Draft {
        Draft {
            writing_style: style.to_string(),
            handedness: "left".to_string(),
            age_group: "26-35".to_string(),
            gender: "male".to_string(),
        }
    }

    #[test]
    fn test_session_id_roundtrip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_session_id_rejects_garbage() {
        assert!("not-a-session".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_put_then_get() {
        let store = DraftStore::new(Duration::from_secs(60));
        let id = SessionId::new();

        store.put(id, sample_draft("cursive"));
        assert_eq!(store.get(id), Some(sample_draft("cursive")));
        // Reading does not consume the draft.
        assert_eq!(store.get(id), Some(sample_draft("cursive")));
    }

    #[test]
    fn test_put_overwrites() {
        let store = DraftStore::new(Duration::from_secs(60));
        let id = SessionId::new();

        store.put(id, sample_draft("cursive"));
        store.put(id, sample_draft("print"));
        assert_eq!(store.get(id).unwrap().writing_style, "print");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_unknown_session() {
        let store = DraftStore::new(Duration::from_secs(60));
        assert!(store.get(SessionId::new()).is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = DraftStore::new(Duration::from_secs(60));
        let a = SessionId::new();
        let b = SessionId::new();

        store.put(a, sample_draft("cursive"));
        assert!(store.get(b).is_none());
    }

    #[test]
    fn test_clear() {
        let store = DraftStore::new(Duration::from_secs(60));
        let id = SessionId::new();

        store.put(id, sample_draft("cursive"));
        store.clear(id);
        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_draft_is_absent() {
        let store = DraftStore::new(Duration::ZERO);
        let id = SessionId::new();

        store.put(id, sample_draft("cursive"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = DraftStore::new(Duration::from_millis(500));
        store.put(SessionId::new(), sample_draft("a"));
        store.put(SessionId::new(), sample_draft("b"));
        assert_eq!(store.purge_expired(), 0);

        std::thread::sleep(Duration::from_millis(600));

        assert_eq!(store.purge_expired(), 2);
        assert!(store.is_empty());
    }
}
