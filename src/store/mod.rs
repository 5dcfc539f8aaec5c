// src/store/mod.rs

//! Durable store collaborator consumed by the in-process state layer.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::StoreError,
    models::{
        answer_record::NewAnswerRecord,
        exam_record::{ExamRecord, ExamRecordPatch, NewExamRecord},
        question::{Question, QuestionFilter, QuestionType},
        stats::{CategoryCount, CategoryStats, WrongAnswer},
        user::User,
    },
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

pub type StoreResult<T> = Result<T, StoreError>;

/// Questions, answer/exam records and the user directory.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find_question_by_id(&self, id: i64) -> StoreResult<Option<Question>>;

    /// Questions matching `filter`, in id order, at most `limit`.
    async fn find_questions(&self, filter: &QuestionFilter, limit: i64)
    -> StoreResult<Vec<Question>>;

    /// Up to `count` distinct questions drawn uniformly at random.
    async fn find_random_questions(
        &self,
        question_type: Option<QuestionType>,
        count: i64,
    ) -> StoreResult<Vec<Question>>;

    async fn list_categories(&self) -> StoreResult<Vec<String>>;

    /// Question count per category, ordered by category.
    async fn count_questions_by_category(&self) -> StoreResult<Vec<CategoryCount>>;

    /// Questions whose content contains `keyword`, in id order, at most `limit`.
    async fn search_questions(
        &self,
        keyword: &str,
        filter: &QuestionFilter,
        limit: i64,
    ) -> StoreResult<Vec<Question>>;

    async fn create_answer_record(&self, record: &NewAnswerRecord) -> StoreResult<()>;

    /// Answer totals of `user_id` per category, ordered by category.
    /// `accuracy` is left at zero.
    async fn answer_stats_by_category(&self, user_id: i64) -> StoreResult<Vec<CategoryStats>>;

    /// Incorrect answers of `user_id`, most recent first, at most `limit`.
    async fn find_wrong_answers(&self, user_id: i64, limit: i64) -> StoreResult<Vec<WrongAnswer>>;

    async fn create_exam_record(&self, record: &NewExamRecord) -> StoreResult<i64>;

    async fn update_exam_record(&self, id: i64, patch: &ExamRecordPatch) -> StoreResult<()>;

    /// Most recent record of `user_id` started at or after `started_after`.
    async fn find_latest_exam_record(
        &self,
        user_id: i64,
        started_after: DateTime<Utc>,
    ) -> StoreResult<Option<ExamRecord>>;

    async fn list_exam_records(&self, user_id: i64, limit: i64) -> StoreResult<Vec<ExamRecord>>;

    /// Returns `None` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn save_login_state(
        &self,
        user_id: i64,
        login_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;
}
