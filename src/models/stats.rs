// src/models/stats.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::QuestionType;

/// Number of questions in one category.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

/// Question bank overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStats {
    pub total: i64,
    pub categories: Vec<CategoryCount>,
}

/// A user's answers in one category.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub total: i64,
    pub correct: i64,
    /// Percentage; filled in after loading.
    #[sqlx(default)]
    pub accuracy: f64,
}

/// One incorrectly answered question, joined with its content.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub question_id: i64,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub category: String,
    pub answered_at: DateTime<Utc>,
}

/// Answering statistics of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_answered: i64,
    pub correct_count: i64,
    pub accuracy: f64,
    pub category_stats: Vec<CategoryStats>,
    /// Most recent first.
    pub wrong_questions: Vec<WrongAnswer>,
}

/// Query parameters for question search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub limit: Option<i64>,
}
