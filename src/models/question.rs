// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Closed set of question kinds. Each kind has its own answer comparison rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multiple,
    Judge,
}

impl QuestionType {
    /// Order in which a mock exam concatenates its per-type draws.
    pub const MOCK_EXAM_ORDER: [QuestionType; 3] =
        [QuestionType::Single, QuestionType::Multiple, QuestionType::Judge];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Judge => "judge",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown question type: {0}")]
pub struct UnknownQuestionType(pub String);

impl FromStr for QuestionType {
    type Err = UnknownQuestionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(QuestionType::Single),
            "multiple" => Ok(QuestionType::Multiple),
            "judge" => Ok(QuestionType::Judge),
            other => Err(UnknownQuestionType(other.to_string())),
        }
    }
}

impl TryFrom<String> for QuestionType {
    type Error = UnknownQuestionType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents the 'questions' table in the database.
/// Immutable once created; mirrored read-only by the question cache.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// The prompt text.
    pub content: String,

    /// Answer options, e.g. ["A. 10Gbps", "B. 20Gbps"]. Stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// Correct answer, trimmed on import. Comma separated for multiple choice.
    pub answer: String,

    pub category: String,

    pub explanation: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to a client (excludes answer and explanation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    pub options: Vec<String>,
    pub category: String,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_type: q.question_type,
            content: q.content.clone(),
            options: q.options.0.clone(),
            category: q.category.clone(),
        }
    }
}

/// Query parameters for listing questions.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionQuery {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub limit: Option<i64>,
}

/// Filter handed to the persistence layer. `None` fields are unconstrained.
#[derive(Debug, Default, Clone)]
pub struct QuestionFilter {
    pub category: Option<String>,
    pub question_type: Option<QuestionType>,
}

impl QuestionFilter {
    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            question_type: None,
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| c == question.category)
            && self
                .question_type
                .is_none_or(|t| t == question.question_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_question_types_case_insensitively() {
        assert_eq!("Single".parse::<QuestionType>().unwrap(), QuestionType::Single);
        assert_eq!(" judge ".parse::<QuestionType>().unwrap(), QuestionType::Judge);
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn question_type_serializes_lowercase() {
        let json = serde_json::to_string(&QuestionType::Multiple).unwrap();
        assert_eq!(json, "\"multiple\"");
    }
}
