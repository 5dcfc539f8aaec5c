// src/services/session_store.rs

//! Concurrent token-keyed stores for login sessions and exams in progress.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::models::{exam::ExamInProgress, session::LoginSession};

/// Concurrent map from opaque token to value.
///
/// Backed by a sharded `DashMap`: every operation locks only the token's
/// shard, so requests on different tokens rarely contend and a scan never
/// holds more than one shard at a time. Values are read by cloning under the
/// shard lock and written under its write lock, so a reader never observes a
/// half-applied update.
pub struct TokenMap<V> {
    entries: DashMap<String, V>,
}

impl<V> TokenMap<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Stores `value`, overwriting any entry already under `token`.
    pub fn insert(&self, token: String, value: V) -> Option<V> {
        self.entries.insert(token, value)
    }

    /// Applies `f` to the entry under the shard's write lock.
    /// Returns `None` when the token is unknown.
    pub fn update<R>(&self, token: &str, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.entries.get_mut(token).map(|mut entry| f(entry.value_mut()))
    }

    pub fn remove(&self, token: &str) -> Option<V> {
        self.entries.remove(token).map(|(_, value)| value)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Number of entries, counted shard by shard.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry matching `stale`, one shard at a time.
    pub fn remove_where(&self, stale: impl Fn(&V) -> bool) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, value| {
            let keep = !stale(value);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

impl<V: Clone> TokenMap<V> {
    pub fn get(&self, token: &str) -> Option<V> {
        self.entries.get(token).map(|entry| entry.value().clone())
    }
}

impl<V> Default for TokenMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Login sessions keyed by login token.
#[derive(Default)]
pub struct SessionStore {
    sessions: TokenMap<LoginSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, token: impl Into<String>, session: LoginSession) {
        self.sessions.insert(token.into(), session);
    }

    /// Looks up a session and refreshes its last activity.
    pub fn get(&self, token: &str) -> Option<LoginSession> {
        self.get_at(token, Utc::now())
    }

    pub fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<LoginSession> {
        self.sessions.update(token, |session| {
            session.last_activity = now;
            session.clone()
        })
    }

    /// Replaces an existing session. Unknown tokens are left absent.
    pub fn update(&self, token: &str, session: LoginSession) -> bool {
        self.sessions.update(token, |current| *current = session).is_some()
    }

    pub fn delete(&self, token: &str) -> Option<LoginSession> {
        self.sessions.remove(token)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions idle for longer than `ttl`.
    pub fn remove_idle(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        self.sessions
            .remove_where(|session| now - session.last_activity > ttl)
    }
}

/// Exams in progress keyed by exam token.
#[derive(Default)]
pub struct ExamSessionStore {
    exams: TokenMap<ExamInProgress>,
}

impl ExamSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, exam: ExamInProgress) {
        self.exams.insert(exam.token.clone(), exam);
    }

    pub fn get(&self, token: &str) -> Option<ExamInProgress> {
        self.exams.get(token)
    }

    /// Replaces an existing exam wholesale. Unknown tokens are left absent.
    pub fn update(&self, token: &str, exam: ExamInProgress) -> bool {
        self.exams.update(token, |current| *current = exam).is_some()
    }

    /// Atomically inspects and mutates one exam.
    pub fn modify<R>(&self, token: &str, f: impl FnOnce(&mut ExamInProgress) -> R) -> Option<R> {
        self.exams.update(token, f)
    }

    pub fn delete(&self, token: &str) -> Option<ExamInProgress> {
        self.exams.remove(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.exams.contains(token)
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }

    /// Drops exams started more than `ttl` ago, completed or not.
    pub fn remove_started_before(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        self.exams.remove_where(|exam| now - exam.started_at > ttl)
    }
}
