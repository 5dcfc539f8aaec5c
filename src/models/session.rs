// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A logged-in user, keyed in the session store by an opaque token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful lookup; drives idle expiry.
    pub last_activity: DateTime<Utc>,
}

impl LoginSession {
    pub fn new(user_id: i64, username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username: username.into(),
            created_at: now,
            last_activity: now,
        }
    }
}

/// Point-in-time view of the in-process state layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub question_hits: u64,
    pub question_misses: u64,
    pub session_count: usize,
    pub exam_count: usize,
}
