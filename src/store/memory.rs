// src/store/memory.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use sqlx::types::Json;

use crate::{
    error::StoreError,
    models::{
        answer_record::{AnswerRecord, NewAnswerRecord},
        exam_record::{ExamRecord, ExamRecordPatch, NewExamRecord},
        question::{Question, QuestionFilter, QuestionType},
        stats::{CategoryCount, CategoryStats, WrongAnswer},
        user::User,
    },
    store::{QuizRepository, StoreResult},
};

#[derive(Default)]
struct Tables {
    questions: BTreeMap<i64, Question>,
    users: BTreeMap<i64, User>,
    answers: Vec<AnswerRecord>,
    exams: BTreeMap<i64, ExamRecord>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process repository for tests and local runs without Postgres.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
    /// Question ids whose lookups fail with `StoreError::Unavailable`.
    failing_questions: RwLock<HashSet<i64>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a question and returns its id. Answer and text are trimmed.
    pub fn insert_question(
        &self,
        question_type: QuestionType,
        content: &str,
        options: &[&str],
        answer: &str,
        category: &str,
    ) -> i64 {
        let mut tables = self.tables.write();
        let id = tables.next_id();
        tables.questions.insert(
            id,
            Question {
                id,
                question_type,
                content: content.trim().to_string(),
                options: Json(options.iter().map(|o| o.to_string()).collect()),
                answer: answer.trim().to_string(),
                category: category.trim().to_string(),
                explanation: None,
                created_at: Some(Utc::now()),
            },
        );
        id
    }

    /// Seeds `count` questions of one type and category, all answered `answer`.
    pub fn seed(&self, question_type: QuestionType, category: &str, count: usize, answer: &str) -> Vec<i64> {
        (0..count)
            .map(|i| {
                self.insert_question(
                    question_type,
                    &format!("{} question {} ({})", question_type, i, category),
                    &["A. first", "B. second", "C. third", "D. fourth"],
                    answer,
                    category,
                )
            })
            .collect()
    }

    /// Makes every later lookup of `question_id` fail.
    pub fn fail_question(&self, question_id: i64) {
        self.failing_questions.write().insert(question_id);
    }

    pub fn answer_records(&self) -> Vec<AnswerRecord> {
        self.tables.read().answers.clone()
    }

    pub fn exam_record(&self, id: i64) -> Option<ExamRecord> {
        self.tables.read().exams.get(&id).cloned()
    }
}

#[async_trait]
impl QuizRepository for MemoryRepository {
    async fn find_question_by_id(&self, id: i64) -> StoreResult<Option<Question>> {
        if self.failing_questions.read().contains(&id) {
            return Err(StoreError::Unavailable(format!("question {} is unreadable", id)));
        }
        Ok(self.tables.read().questions.get(&id).cloned())
    }

    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        limit: i64,
    ) -> StoreResult<Vec<Question>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .tables
            .read()
            .questions
            .values()
            .filter(|q| filter.matches(q))
            .take(limit)
            .cloned()
            .collect())
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
        let mut matching: Vec<Question> = self
            .tables
            .read()
            .questions
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();

        matching.shuffle(&mut rand::thread_rng());
        matching.truncate(usize::try_from(count).unwrap_or(0));
        Ok(matching)
    }

    async fn list_categories(&self) -> StoreResult<Vec<String>> {
        let categories: BTreeSet<String> = self
            .tables
            .read()
            .questions
            .values()
            .map(|q| q.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn count_questions_by_category(&self) -> StoreResult<Vec<CategoryCount>> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for question in self.tables.read().questions.values() {
            *counts.entry(question.category.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, count)| CategoryCount { name, count })
            .collect())
    }

    async fn search_questions(
        &self,
        keyword: &str,
        filter: &QuestionFilter,
        limit: i64,
    ) -> StoreResult<Vec<Question>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .tables
            .read()
            .questions
            .values()
            .filter(|q| q.content.contains(keyword) && filter.matches(q))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn answer_stats_by_category(&self, user_id: i64) -> StoreResult<Vec<CategoryStats>> {
        let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for answer in self.tables.read().answers.iter().filter(|a| a.user_id == user_id) {
            let (total, correct) = totals.entry(answer.category.clone()).or_default();
            *total += 1;
            if answer.is_correct {
                *correct += 1;
            }
        }
        Ok(totals
            .into_iter()
            .map(|(category, (total, correct))| CategoryStats {
                category,
                total,
                correct,
                accuracy: 0.0,
            })
            .collect())
    }

    async fn find_wrong_answers(&self, user_id: i64, limit: i64) -> StoreResult<Vec<WrongAnswer>> {
        let tables = self.tables.read();
        let mut wrong: Vec<(i64, WrongAnswer)> = tables
            .answers
            .iter()
            .filter(|a| a.user_id == user_id && !a.is_correct)
            .filter_map(|a| {
                let question = tables.questions.get(&a.question_id)?;
                Some((
                    a.id,
                    WrongAnswer {
                        question_id: a.question_id,
                        question: question.content.clone(),
                        user_answer: a.user_answer.clone(),
                        correct_answer: question.answer.clone(),
                        category: a.category.clone(),
                        answered_at: a.answered_at,
                    },
                ))
            })
            .collect();

        wrong.sort_by(|(a_id, a), (b_id, b)| (b.answered_at, b_id).cmp(&(a.answered_at, a_id)));
        wrong.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(wrong.into_iter().map(|(_, answer)| answer).collect())
    }

    async fn create_answer_record(&self, record: &NewAnswerRecord) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let id = tables.next_id();
        tables.answers.push(AnswerRecord {
            id,
            user_id: record.user_id,
            question_id: record.question_id,
            user_answer: record.user_answer.clone(),
            is_correct: record.is_correct,
            category: record.category.clone(),
            answered_at: record.answered_at,
        });
        Ok(())
    }

    async fn create_exam_record(&self, record: &NewExamRecord) -> StoreResult<i64> {
        let mut tables = self.tables.write();
        let id = tables.next_id();
        tables.exams.insert(
            id,
            ExamRecord {
                id,
                user_id: record.user_id,
                exam_type: record.exam_type.clone(),
                total_count: record.total_count,
                correct_count: 0,
                score: 0.0,
                duration_seconds: 0,
                started_at: record.started_at,
                completed_at: None,
            },
        );
        Ok(id)
    }

    async fn update_exam_record(&self, id: i64, patch: &ExamRecordPatch) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let record = tables
            .exams
            .get_mut(&id)
            .ok_or_else(|| StoreError::InvalidData(format!("exam record {} does not exist", id)))?;
        record.correct_count = patch.correct_count;
        record.score = patch.score;
        record.duration_seconds = patch.duration_seconds;
        record.completed_at = Some(patch.completed_at);
        Ok(())
    }

    async fn find_latest_exam_record(
        &self,
        user_id: i64,
        started_after: DateTime<Utc>,
    ) -> StoreResult<Option<ExamRecord>> {
        Ok(self
            .tables
            .read()
            .exams
            .values()
            .filter(|r| r.user_id == user_id && r.started_at >= started_after)
            .max_by_key(|r| (r.started_at, r.id))
            .cloned())
    }

    async fn list_exam_records(&self, user_id: i64, limit: i64) -> StoreResult<Vec<ExamRecord>> {
        let mut records: Vec<ExamRecord> = self
            .tables
            .read()
            .exams
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.started_at, b.id).cmp(&(a.started_at, a.id)));
        records.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(records)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.username == username) {
            return Ok(None);
        }
        let id = tables.next_id();
        let user = User {
            id,
            username: username.to_string(),
            password: password_hash.to_string(),
            login_attempts: 0,
            locked_until: None,
            created_at: Some(Utc::now()),
        };
        tables.users.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn save_login_state(
        &self,
        user_id: i64,
        login_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.login_attempts = login_attempts;
            user.locked_until = locked_until;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn random_draw_respects_type_and_count() {
        let repo = MemoryRepository::new();
        repo.seed(QuestionType::Single, "network", 10, "A");
        repo.seed(QuestionType::Judge, "network", 5, "正确");

        let drawn = repo
            .find_random_questions(Some(QuestionType::Judge), 3)
            .await
            .unwrap();
        assert_eq!(drawn.len(), 3);
        assert!(drawn.iter().all(|q| q.question_type == QuestionType::Judge));

        let all_judge = repo
            .find_random_questions(Some(QuestionType::Judge), 50)
            .await
            .unwrap();
        assert_eq!(all_judge.len(), 5);
    }

    #[tokio::test]
    async fn failing_question_reports_unavailable() {
        let repo = MemoryRepository::new();
        let ids = repo.seed(QuestionType::Single, "os", 1, "B");
        repo.fail_question(ids[0]);

        let err = repo.find_question_by_id(ids[0]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = MemoryRepository::new();
        assert!(repo.create_user("alice", "hash").await.unwrap().is_some());
        assert!(repo.create_user("alice", "hash").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_matches_content_and_filter() {
        let repo = MemoryRepository::new();
        repo.insert_question(QuestionType::Single, "What is TCP?", &["A. a"], "A", "network");
        repo.insert_question(QuestionType::Judge, "TCP is reliable", &["正确", "错误"], "正确", "network");
        repo.insert_question(QuestionType::Single, "What is RAID?", &["A. a"], "A", "storage");

        let all = repo
            .search_questions("TCP", &QuestionFilter::default(), 50)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let judge_only = QuestionFilter {
            category: None,
            question_type: Some(QuestionType::Judge),
        };
        let judged = repo.search_questions("TCP", &judge_only, 50).await.unwrap();
        assert_eq!(judged.len(), 1);
        assert_eq!(judged[0].content, "TCP is reliable");
    }

    #[tokio::test]
    async fn wrong_answers_are_newest_first() {
        let repo = MemoryRepository::new();
        let ids = repo.seed(QuestionType::Single, "network", 3, "A");
        let base = Utc::now();

        for (offset, (&question_id, is_correct)) in ids.iter().zip([false, true, false]).enumerate() {
            repo.create_answer_record(&NewAnswerRecord {
                user_id: 9,
                question_id,
                user_answer: "B".to_string(),
                is_correct,
                category: "network".to_string(),
                answered_at: base + chrono::Duration::seconds(offset as i64),
            })
            .await
            .unwrap();
        }

        let wrong = repo.find_wrong_answers(9, 50).await.unwrap();
        assert_eq!(wrong.len(), 2);
        assert_eq!(wrong[0].question_id, ids[2]);
        assert_eq!(wrong[0].correct_answer, "A");

        let stats = repo.answer_stats_by_category(9).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!((stats[0].total, stats[0].correct), (3, 1));
    }
}
