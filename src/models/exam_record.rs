// src/models/exam_record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'exam_records' table in the database.
/// Opened with zero score when an exam starts, patched once at completion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamRecord {
    pub id: i64,
    pub user_id: i64,
    pub exam_type: String,
    pub total_count: i32,
    pub correct_count: i32,
    pub score: f64,
    /// Seconds actually spent.
    pub duration_seconds: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewExamRecord {
    pub user_id: i64,
    pub exam_type: String,
    pub total_count: i32,
    pub started_at: DateTime<Utc>,
}

/// Values written when an exam completes.
#[derive(Debug, Clone)]
pub struct ExamRecordPatch {
    pub correct_count: i32,
    pub score: f64,
    pub duration_seconds: i32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    pub since: Option<DateTime<Utc>>,
}
