// src/models/answer_record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'user_answers' table: one graded answer per row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub user_answer: String,
    pub is_correct: bool,
    pub category: String,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnswerRecord {
    pub user_id: i64,
    pub question_id: i64,
    pub user_answer: String,
    pub is_correct: bool,
    pub category: String,
    pub answered_at: DateTime<Utc>,
}

/// DTO for answering a single question, standalone or inside an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct AnswerRequest {
    pub question_id: i64,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}

/// Immediate feedback for a standalone answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
