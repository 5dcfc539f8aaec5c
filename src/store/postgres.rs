// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    models::{
        answer_record::NewAnswerRecord,
        exam_record::{ExamRecord, ExamRecordPatch, NewExamRecord},
        question::{Question, QuestionFilter, QuestionType},
        stats::{CategoryCount, CategoryStats, WrongAnswer},
        user::User,
    },
    store::{QuizRepository, StoreResult},
};

const QUESTION_COLUMNS: &str =
    "SELECT id, type, content, options, answer, category, explanation, created_at FROM questions";

const EXAM_RECORD_COLUMNS: &str = "SELECT id, user_id, exam_type, total_count, correct_count, \
     score, duration_seconds, started_at, completed_at FROM exam_records";

/// Postgres-backed repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends `WHERE` clauses for the filter's constrained fields.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &QuestionFilter) {
    let mut keyword = " WHERE ";

    if let Some(category) = &filter.category {
        builder.push(keyword).push("category = ").push_bind(category.clone());
        keyword = " AND ";
    }
    if let Some(question_type) = filter.question_type {
        builder.push(keyword).push("type = ").push_bind(question_type.as_str());
    }
}

#[async_trait]
impl QuizRepository for PgRepository {
    async fn find_question_by_id(&self, id: i64) -> StoreResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!("{} WHERE id = $1", QUESTION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        limit: i64,
    ) -> StoreResult<Vec<Question>> {
        let mut builder = QueryBuilder::<Postgres>::new(QUESTION_COLUMNS);
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY id LIMIT ").push_bind(limit);

        let questions = builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await?;
        Ok(questions)
    }

    async fn find_random_questions(
        &self,
        question_type: Option<QuestionType>,
        count: i64,
    ) -> StoreResult<Vec<Question>> {
        let filter = QuestionFilter {
            category: None,
            question_type,
        };
        let mut builder = QueryBuilder::<Postgres>::new(QUESTION_COLUMNS);
        push_filter(&mut builder, &filter);
        builder.push(" ORDER BY RANDOM() LIMIT ").push_bind(count);

        let questions = builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await?;
        Ok(questions)
    }

    async fn list_categories(&self) -> StoreResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM questions ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn count_questions_by_category(&self) -> StoreResult<Vec<CategoryCount>> {
        let counts = sqlx::query_as::<_, CategoryCount>(
            "SELECT category AS name, COUNT(*) AS count FROM questions GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn search_questions(
        &self,
        keyword: &str,
        filter: &QuestionFilter,
        limit: i64,
    ) -> StoreResult<Vec<Question>> {
        let mut builder = QueryBuilder::<Postgres>::new(QUESTION_COLUMNS);
        builder
            .push(" WHERE content LIKE '%' || ")
            .push_bind(keyword.to_string())
            .push(" || '%'");
        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(question_type) = filter.question_type {
            builder.push(" AND type = ").push_bind(question_type.as_str());
        }
        builder.push(" ORDER BY id LIMIT ").push_bind(limit);

        let questions = builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await?;
        Ok(questions)
    }

    async fn answer_stats_by_category(&self, user_id: i64) -> StoreResult<Vec<CategoryStats>> {
        let stats = sqlx::query_as::<_, CategoryStats>(
            r#"
            SELECT category, COUNT(*) AS total, COUNT(*) FILTER (WHERE is_correct) AS correct
            FROM user_answers
            WHERE user_id = $1
            GROUP BY category
            ORDER BY category
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn find_wrong_answers(&self, user_id: i64, limit: i64) -> StoreResult<Vec<WrongAnswer>> {
        let wrong = sqlx::query_as::<_, WrongAnswer>(
            r#"
            SELECT ua.question_id, q.content AS question, ua.user_answer,
                   q.answer AS correct_answer, ua.category, ua.answered_at
            FROM user_answers ua
            JOIN questions q ON q.id = ua.question_id
            WHERE ua.user_id = $1 AND NOT ua.is_correct
            ORDER BY ua.answered_at DESC, ua.id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(wrong)
    }

    async fn create_answer_record(&self, record: &NewAnswerRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_answers (user_id, question_id, user_answer, is_correct, category, answered_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.user_id)
        .bind(record.question_id)
        .bind(&record.user_answer)
        .bind(record.is_correct)
        .bind(&record.category)
        .bind(record.answered_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_exam_record(&self, record: &NewExamRecord) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO exam_records (user_id, exam_type, total_count, correct_count, score, started_at)
            VALUES ($1, $2, $3, 0, 0, $4)
            RETURNING id
            "#,
        )
        .bind(record.user_id)
        .bind(&record.exam_type)
        .bind(record.total_count)
        .bind(record.started_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_exam_record(&self, id: i64, patch: &ExamRecordPatch) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE exam_records
            SET correct_count = $1, score = $2, duration_seconds = $3, completed_at = $4
            WHERE id = $5
            "#,
        )
        .bind(patch.correct_count)
        .bind(patch.score)
        .bind(patch.duration_seconds)
        .bind(patch.completed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_latest_exam_record(
        &self,
        user_id: i64,
        started_after: DateTime<Utc>,
    ) -> StoreResult<Option<ExamRecord>> {
        let record = sqlx::query_as::<_, ExamRecord>(&format!(
            "{} WHERE user_id = $1 AND started_at >= $2 ORDER BY started_at DESC LIMIT 1",
            EXAM_RECORD_COLUMNS
        ))
        .bind(user_id)
        .bind(started_after)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_exam_records(&self, user_id: i64, limit: i64) -> StoreResult<Vec<ExamRecord>> {
        let records = sqlx::query_as::<_, ExamRecord>(&format!(
            "{} WHERE user_id = $1 ORDER BY started_at DESC LIMIT $2",
            EXAM_RECORD_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password, login_attempts, locked_until, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, login_attempts, locked_until, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn save_login_state(
        &self,
        user_id: i64,
        login_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE users SET login_attempts = $1, locked_until = $2 WHERE id = $3")
            .bind(login_attempts)
            .bind(locked_until)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
