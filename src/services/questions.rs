// src/services/questions.rs

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    error::ExamError,
    models::{
        answer_record::{AnswerFeedback, NewAnswerRecord},
        question::{Question, QuestionFilter, QuestionType},
        session::LoginSession,
    },
    services::{QuizService, evaluator},
};

impl QuizService {
    /// Cache-first lookup, falling back to the durable store on a miss.
    pub async fn question(&self, id: i64) -> Result<Arc<Question>, ExamError> {
        if let Some(question) = self.cache.get(id) {
            return Ok(question);
        }

        debug!(question_id = id, "Question cache miss");
        let question = self
            .repo
            .find_question_by_id(id)
            .await?
            .ok_or_else(|| ExamError::NotFound(format!("question {}", id)))?;

        Ok(self.cache.put(question))
    }

    /// Filtered listing; results are cached.
    pub async fn find_questions(
        &self,
        filter: &QuestionFilter,
        limit: i64,
    ) -> Result<Vec<Question>, ExamError> {
        let questions = self.repo.find_questions(filter, limit).await?;
        self.cache.put_many(questions.iter().cloned());
        Ok(questions)
    }

    /// Random sample of at most `limit` questions; results are cached.
    pub async fn sample_questions(
        &self,
        question_type: Option<QuestionType>,
        limit: i64,
    ) -> Result<Vec<Question>, ExamError> {
        let questions = self.repo.find_random_questions(question_type, limit).await?;
        self.cache.put_many(questions.iter().cloned());
        Ok(questions)
    }

    /// Draws exactly `count` distinct random questions, or fails with
    /// `QuestionSourceExhausted`. Drawn questions are cached.
    pub async fn draw_questions(
        &self,
        question_type: Option<QuestionType>,
        count: usize,
    ) -> Result<Vec<Question>, ExamError> {
        let requested = i64::try_from(count).unwrap_or(i64::MAX);
        let drawn = self.repo.find_random_questions(question_type, requested).await?;

        let mut seen = HashSet::with_capacity(drawn.len());
        let distinct: Vec<Question> = drawn
            .into_iter()
            .filter(|q| seen.insert(q.id))
            .take(count)
            .collect();

        if distinct.len() < count {
            return Err(ExamError::QuestionSourceExhausted {
                question_type: question_type.map_or("any", |t| t.as_str()).to_string(),
                requested: count,
                available: distinct.len(),
            });
        }

        self.cache.put_many(distinct.iter().cloned());
        Ok(distinct)
    }

    /// Loads up to `per_category` questions of every category into the cache.
    ///
    /// A category that fails to load is skipped. Returns the number of
    /// questions put into the cache.
    pub async fn preload_questions(&self, per_category: i64) -> Result<usize, ExamError> {
        let categories = self.repo.list_categories().await?;
        let mut loaded = 0;

        for category in categories {
            match self
                .repo
                .find_questions(&QuestionFilter::by_category(category.as_str()), per_category)
                .await
            {
                Ok(questions) => {
                    loaded += questions.len();
                    self.cache.put_many(questions);
                }
                Err(e) => warn!(category = %category, "Failed to preload questions: {}", e),
            }
        }

        Ok(loaded)
    }

    /// Grades one standalone answer immediately and records it.
    pub async fn check_answer(
        &self,
        session: &LoginSession,
        question_id: i64,
        answer: &str,
    ) -> Result<AnswerFeedback, ExamError> {
        let question = self.question(question_id).await?;
        let user_answer = answer.trim();
        let is_correct = evaluator::is_correct(question.question_type, user_answer, &question.answer);

        self.repo
            .create_answer_record(&NewAnswerRecord {
                user_id: session.user_id,
                question_id,
                user_answer: user_answer.to_string(),
                is_correct,
                category: question.category.clone(),
                answered_at: Utc::now(),
            })
            .await?;

        Ok(AnswerFeedback {
            is_correct,
            correct_answer: question.answer.clone(),
            explanation: question.explanation.clone(),
        })
    }
}
