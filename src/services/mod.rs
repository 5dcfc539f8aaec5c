// src/services/mod.rs

//! In-process state layer between the HTTP handlers and the durable store.

pub mod evaluator;
pub mod exam;
pub mod question_cache;
pub mod questions;
pub mod session_store;
pub mod stats;
pub mod sweeper;

use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::Config,
    models::session::{CacheStats, LoginSession},
    services::{
        question_cache::QuestionCache,
        session_store::{ExamSessionStore, SessionStore},
        sweeper::ExpirySweeper,
    },
    store::QuizRepository,
    utils::token,
};

/// Question cache, session stores and exam lifecycle over one repository.
///
/// Constructed once at startup and shared through `AppState`.
pub struct QuizService {
    repo: Arc<dyn QuizRepository>,
    cache: QuestionCache,
    sessions: Arc<SessionStore>,
    exams: Arc<ExamSessionStore>,
    session_ttl: chrono::Duration,
}

impl QuizService {
    pub fn new(repo: Arc<dyn QuizRepository>, config: &Config) -> Self {
        Self {
            repo,
            cache: QuestionCache::new(config.question_cache_capacity),
            sessions: Arc::new(SessionStore::new()),
            exams: Arc::new(ExamSessionStore::new()),
            session_ttl: chrono::Duration::seconds(config.session_ttl_secs),
        }
    }

    pub fn repository(&self) -> &Arc<dyn QuizRepository> {
        &self.repo
    }

    pub fn cache(&self) -> &QuestionCache {
        &self.cache
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn exams(&self) -> &ExamSessionStore {
        &self.exams
    }

    /// Sweeper over this service's stores, not yet running.
    pub fn sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(
            Arc::clone(&self.sessions),
            Arc::clone(&self.exams),
            self.session_ttl,
        )
    }

    /// Opens a login session and returns its token.
    pub fn open_session(&self, user_id: i64, username: &str) -> String {
        let token = token::login_token();
        self.sessions
            .create(token.clone(), LoginSession::new(user_id, username, Utc::now()));
        token
    }

    /// Resolves a login token, refreshing its activity.
    pub fn session(&self, token: &str) -> Option<LoginSession> {
        self.sessions.get(token)
    }

    pub fn close_session(&self, token: &str) -> bool {
        self.sessions.delete(token).is_some()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            question_hits: self.cache.hits(),
            question_misses: self.cache.misses(),
            session_count: self.sessions.len(),
            exam_count: self.exams.len(),
        }
    }
}
