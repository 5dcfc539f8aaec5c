// src/config.rs

use std::env;

use dotenvy::dotenv;

/// Practice mode: number of questions drawn, no type constraint.
pub const PRACTICE_QUESTION_COUNT: usize = 20;

/// Mock exam: questions drawn per type (single, multiple, judge).
pub const MOCK_EXAM_QUESTIONS_PER_TYPE: usize = 60;

/// Mock exam time budget in minutes. Practice mode is untimed (0).
pub const MOCK_EXAM_DURATION_MINUTES: u32 = 180;

/// Failed logins before the account is locked.
pub const MAX_LOGIN_ATTEMPTS: i32 = 3;

/// Lock duration after too many failed logins.
pub const LOGIN_LOCK_MINUTES: i64 = 5;

pub const DEFAULT_QUESTION_LIMIT: i64 = 20;
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Most recent wrong answers reported in user statistics.
pub const WRONG_ANSWER_LIMIT: i64 = 50;

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub log_dir: String,
    /// Capacity of the LRU question cache.
    pub question_cache_capacity: usize,
    /// Questions per category loaded into the cache at startup.
    pub preload_per_category: i64,
    /// Period of the expiry sweeper.
    pub sweep_interval_secs: u64,
    /// Idle lifetime of login sessions and maximum age of exam sessions.
    pub session_ttl_secs: i64,
    /// Default page sizes when the request gives none.
    pub question_limit: i64,
    pub history_limit: i64,
    pub search_limit: i64,
    /// Settings that fell back to their default while loading.
    /// Logged by `log_fallbacks` once tracing is installed.
    pub fallbacks: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let log_dir = env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string());

        let mut fallbacks = Vec::new();
        let mut number = |key: &str, default: i64, min: i64| -> i64 {
            let raw = env::var(key).ok();
            parse_value(raw.as_deref(), default, min).unwrap_or_else(|reason| {
                fallbacks.push(format!("{} for {}, using default {}", reason, key, default));
                default
            })
        };

        let question_cache_capacity = number("QUESTION_CACHE_CAPACITY", 500, 1) as usize;
        let preload_per_category = number("PRELOAD_PER_CATEGORY", 50, 0);
        let session_ttl_secs = number("SESSION_TTL_SECS", 24 * 60 * 60, 1);
        let question_limit = number("QUESTION_LIMIT", DEFAULT_QUESTION_LIMIT, 1);
        let history_limit = number("HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT, 1);
        let search_limit = number("SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT, 1);
        let sweep_interval_secs =
            number("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS as i64, 1) as u64;

        Self {
            database_url,
            rust_log,
            bind_addr,
            log_dir,
            question_cache_capacity,
            preload_per_category,
            sweep_interval_secs,
            session_ttl_secs,
            question_limit,
            history_limit,
            search_limit,
            fallbacks,
        }
    }

    /// Configuration for tests and local runs that never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            rust_log: "error".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            log_dir: "logs".to_string(),
            question_cache_capacity: 500,
            preload_per_category: 50,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            session_ttl_secs: 24 * 60 * 60,
            question_limit: DEFAULT_QUESTION_LIMIT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            fallbacks: Vec::new(),
        }
    }

    /// Warns about every setting that fell back to its default.
    pub fn log_fallbacks(&self) {
        for fallback in &self.fallbacks {
            tracing::warn!("{}", fallback);
        }
    }
}

/// Parses a numeric setting.
///
/// Unset keeps `default`. A malformed value or one below `min` is rejected
/// with the reason, and the caller keeps the default.
fn parse_value(raw: Option<&str>, default: i64, min: i64) -> Result<i64, String> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("Invalid value {:?}", raw))?;
    if value < min {
        return Err(format!("Value {} is below the minimum {}", value, min));
    }
    Ok(value)
}
