//! Per-run session memory with TTL expiry.
//!
//! Sessions live only in process memory. Expiry is evaluated lazily when a
//! session is requested from the [`SessionStore`]; there is no background
//! sweep.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the session conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

/// Ephemeral key/value state plus an ordered conversation log.
///
/// Agents only hold a shared reference through the run context, so both
/// the state map and the log sit behind their own lock.
#[derive(Debug)]
pub struct SessionMemory {
    session_id: String,
    ttl_minutes: u32,
    created_at: DateTime<Utc>,
    state: Mutex<HashMap<String, Value>>,
    conversation: Mutex<Vec<ConversationTurn>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionMemory {
    /// Creates a session that starts now.
    pub fn new(session_id: impl Into<String>, ttl_minutes: u32) -> Self {
        Self::created_at(session_id, ttl_minutes, Utc::now())
    }

    /// Creates a session with an explicit creation time.
    pub fn created_at(
        session_id: impl Into<String>,
        ttl_minutes: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            ttl_minutes,
            created_at,
            state: Mutex::new(HashMap::new()),
            conversation: Mutex::new(Vec::new()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.ttl_minutes))
    }

    /// True once more than the TTL has elapsed since creation.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry relative to `now`. Exactly at the TTL the session is still live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > self.ttl()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        lock(&self.state).get(key).cloned()
    }

    /// Returns the stored value or `default`.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        lock(&self.state).insert(key.into(), value);
    }

    pub fn append_conversation(&self, role: impl Into<String>, content: impl Into<String>) {
        lock(&self.conversation).push(ConversationTurn {
            role: role.into(),
            content: content.into(),
        });
    }

    /// Snapshot of the conversation log in insertion order.
    pub fn conversation(&self) -> Vec<ConversationTurn> {
        lock(&self.conversation).clone()
    }
}

/// Session store keyed by session id.
#[derive(Debug)]
pub struct SessionStore {
    ttl_minutes: u32,
    sessions: Mutex<HashMap<String, Arc<SessionMemory>>>,
}

impl SessionStore {
    pub fn new(ttl_minutes: u32) -> Self {
        Self {
            ttl_minutes,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_minutes(&self) -> u32 {
        self.ttl_minutes
    }

    /// Returns the live session for `session_id`, replacing it with a fresh
    /// one if it is absent or expired. Creating a session also evicts every
    /// other expired entry.
    pub fn get_session(&self, session_id: &str) -> Arc<SessionMemory> {
        self.get_session_at(session_id, Utc::now())
    }

    /// Same as [`get_session`](Self::get_session) with an explicit clock.
    pub fn get_session_at(&self, session_id: &str, now: DateTime<Utc>) -> Arc<SessionMemory> {
        let mut sessions = lock(&self.sessions);
        if let Some(session) = sessions.get(session_id) {
            if !session.is_expired_at(now) {
                return Arc::clone(session);
            }
            tracing::debug!(session_id, "Session expired; replacing");
        }

        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired sessions");
        }

        let session = Arc::new(SessionMemory::created_at(
            session_id,
            self.ttl_minutes,
            now,
        ));
        sessions.insert(session_id.to_string(), Arc::clone(&session));
        session
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_session_is_not_expired() {
        let session = SessionMemory::new("s1", 60);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_expiry_boundary() {
        let start = Utc::now();
        let session = SessionMemory::created_at("s1", 60, start);

        assert!(!session.is_expired_at(start + Duration::minutes(59)));
        assert!(
            !session.is_expired_at(start + Duration::minutes(60)),
            "exactly at the TTL the session is still live"
        );
        assert!(session.is_expired_at(start + Duration::minutes(60) + Duration::milliseconds(1)));
    }

    #[test]
    fn test_state_get_set() {
        let session = SessionMemory::new("s1", 60);
        assert!(session.get("missing").is_none());
        assert_eq!(session.get_or("missing", json!("fallback")), json!("fallback"));

        session.set("organizer_summary", json!("hello"));
        assert_eq!(session.get("organizer_summary"), Some(json!("hello")));
    }

    #[test]
    fn test_conversation_preserves_order() {
        let session = SessionMemory::new("s1", 60);
        session.append_conversation("organizer", "first");
        session.append_conversation("assistant", "second");
        session.append_conversation("organizer", "third");

        let contents: Vec<_> = session
            .conversation()
            .into_iter()
            .map(|turn| turn.content)
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_store_returns_same_live_session() {
        let store = SessionStore::new(60);
        let now = Utc::now();

        let first = store.get_session_at("abc", now);
        first.set("k", json!(1));
        let second = store.get_session_at("abc", now + Duration::minutes(30));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_store_replaces_expired_session() {
        let store = SessionStore::new(10);
        let now = Utc::now();

        let first = store.get_session_at("abc", now);
        first.set("k", json!(1));
        let replacement = store.get_session_at("abc", now + Duration::minutes(11));

        assert!(!Arc::ptr_eq(&first, &replacement));
        assert!(replacement.get("k").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_evicts_expired_sessions_on_insert() {
        let store = SessionStore::new(10);
        let now = Utc::now();

        store.get_session_at("run-1", now);
        store.get_session_at("run-2", now + Duration::minutes(5));
        assert_eq!(store.len(), 2);

        // run-1 has expired by now; run-2 is still live.
        store.get_session_at("run-3", now + Duration::minutes(12));
        assert_eq!(store.len(), 2);
        let run_2 = store.get_session_at("run-2", now + Duration::minutes(12));
        assert_eq!(run_2.creation_time(), now + Duration::minutes(5));
    }

    #[test]
    fn test_store_keeps_sessions_separate() {
        let store = SessionStore::new(10);
        store.get_session("a").set("k", json!("a"));
        store.get_session("b").set("k", json!("b"));

        assert_eq!(store.get_session("a").get("k"), Some(json!("a")));
        assert_eq!(store.len(), 2);
    }
}
