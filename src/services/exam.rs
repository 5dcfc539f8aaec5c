// src/services/exam.rs

//! Exam lifecycle: start, inspect, answer, complete.
//!
//! An exam lives in the exam session store from `start` until `complete`
//! removes it or the sweeper reclaims it. Answer submission and the
//! completion flag are mutated under the entry's shard lock, so a submit
//! either lands before completion snapshots the answers (and is graded) or
//! observes the flag and fails with `AlreadyCompleted`.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    config::MOCK_EXAM_QUESTIONS_PER_TYPE,
    error::ExamError,
    models::{
        answer_record::NewAnswerRecord,
        exam::{ExamInProgress, ExamMode, ExamResult, ExamSessionView, ExamStarted},
        exam_record::{ExamRecordPatch, NewExamRecord},
        question::{PublicQuestion, Question, QuestionType},
    },
    services::{QuizService, evaluator},
    utils::token,
};

/// Percentage of correct answers; 0 for an empty exam.
pub fn score(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

impl QuizService {
    /// Draws the question set for `mode`, opens the summary record and
    /// registers the exam under a fresh token.
    pub async fn start_exam(&self, user_id: i64, mode: ExamMode) -> Result<ExamStarted, ExamError> {
        let questions = self.draw_exam_questions(mode).await?;
        let started_at = Utc::now();

        let record_id = self
            .repo
            .create_exam_record(&NewExamRecord {
                user_id,
                exam_type: mode.as_str().to_string(),
                total_count: questions.len() as i32,
                started_at,
            })
            .await?;

        let exam = ExamInProgress {
            token: token::exam_token(),
            user_id,
            mode,
            record_id,
            question_ids: questions.iter().map(|q| q.id).collect(),
            answers: HashMap::new(),
            started_at,
            duration_minutes: mode.duration_minutes(),
            completed: false,
        };
        let session_id = exam.token.clone();
        self.exams.create(exam);

        info!(user_id, exam_type = %mode, questions = questions.len(), "Exam started");

        Ok(ExamStarted {
            session_id,
            exam_type: mode,
            questions: questions.iter().map(PublicQuestion::from).collect(),
            duration: mode.duration_minutes(),
            start_time: started_at,
        })
    }

    async fn draw_exam_questions(&self, mode: ExamMode) -> Result<Vec<Question>, ExamError> {
        match mode {
            ExamMode::Practice => self.draw_questions(None, mode.question_count()).await,
            ExamMode::MockExam => {
                let mut questions = Vec::with_capacity(mode.question_count());
                for question_type in QuestionType::MOCK_EXAM_ORDER {
                    let drawn = self
                        .draw_questions(Some(question_type), MOCK_EXAM_QUESTIONS_PER_TYPE)
                        .await?;
                    questions.extend(drawn);
                }
                Ok(questions)
            }
        }
    }

    /// Returns the exam with its questions (answers hidden) and time left.
    pub async fn exam_session(&self, token: &str, user_id: i64) -> Result<ExamSessionView, ExamError> {
        let exam = self.owned_exam(token, user_id)?;

        let mut questions = Vec::with_capacity(exam.question_ids.len());
        for &question_id in &exam.question_ids {
            match self.question(question_id).await {
                Ok(question) => questions.push(PublicQuestion::from(question.as_ref())),
                Err(e) => warn!(question_id, "Skipping unavailable exam question: {}", e),
            }
        }

        let remaining_time = exam.remaining_minutes(Utc::now());
        Ok(ExamSessionView {
            session: exam,
            questions,
            remaining_time,
        })
    }

    /// Records (or overwrites) the answer to one assigned question.
    pub fn submit_exam_answer(
        &self,
        token: &str,
        user_id: i64,
        question_id: i64,
        answer: &str,
    ) -> Result<(), ExamError> {
        let now = Utc::now();
        self.exams
            .modify(token, |exam| {
                if exam.user_id != user_id {
                    return Err(ExamError::Forbidden);
                }
                if exam.completed {
                    return Err(ExamError::AlreadyCompleted);
                }
                if exam.is_expired(now) {
                    return Err(ExamError::Expired);
                }
                if !exam.is_assigned(question_id) {
                    return Err(ExamError::NotFound(format!("question {} in this exam", question_id)));
                }
                exam.answers.insert(question_id, answer.to_string());
                Ok(())
            })
            .unwrap_or_else(|| Err(exam_not_found()))
    }

    /// Grades every assigned question, records the results and removes the exam.
    ///
    /// A question whose content cannot be fetched is skipped from grading but
    /// still counts toward the total. Answer records that fail to persist are
    /// logged and skipped. The exam is removed even when the summary update
    /// fails; that failure is then returned.
    pub async fn complete_exam(&self, token: &str, user_id: i64) -> Result<ExamResult, ExamError> {
        let snapshot = self
            .exams
            .modify(token, |exam| {
                if exam.user_id != user_id {
                    return Err(ExamError::Forbidden);
                }
                exam.completed = true;
                Ok(exam.clone())
            })
            .unwrap_or_else(|| Err(exam_not_found()))?;

        let total = snapshot.question_ids.len();
        let mut correct = 0;

        for &question_id in &snapshot.question_ids {
            let question = match self.question(question_id).await {
                Ok(question) => question,
                Err(e) => {
                    warn!(question_id, token, "Skipping question during grading: {}", e);
                    continue;
                }
            };

            let submitted = snapshot.answers.get(&question_id).map(String::as_str);
            let is_correct = evaluator::grade(question.question_type, submitted, &question.answer);
            if is_correct {
                correct += 1;
            }

            let record = NewAnswerRecord {
                user_id,
                question_id,
                user_answer: submitted.unwrap_or_default().to_string(),
                is_correct,
                category: question.category.clone(),
                answered_at: Utc::now(),
            };
            if let Err(e) = self.repo.create_answer_record(&record).await {
                error!(question_id, "Failed to save answer record: {}", e);
            }
        }

        let completed_at = Utc::now();
        let elapsed = completed_at - snapshot.started_at;
        let result = ExamResult {
            total_questions: total,
            correct_answers: correct,
            score: score(correct, total),
            duration: elapsed.num_minutes(),
            completed_at,
        };

        let patch = ExamRecordPatch {
            correct_count: correct as i32,
            score: result.score,
            duration_seconds: i32::try_from(elapsed.num_seconds()).unwrap_or(i32::MAX),
            completed_at,
        };
        let updated = self.repo.update_exam_record(snapshot.record_id, &patch).await;

        self.exams.delete(token);

        updated.map_err(|e| {
            error!(record_id = snapshot.record_id, "Failed to update exam record: {}", e);
            ExamError::from(e)
        })?;

        info!(user_id, correct, total, score = result.score, "Exam completed");
        Ok(result)
    }

    fn owned_exam(&self, token: &str, user_id: i64) -> Result<ExamInProgress, ExamError> {
        let exam = self.exams.get(token).ok_or_else(exam_not_found)?;
        if exam.user_id != user_id {
            return Err(ExamError::Forbidden);
        }
        Ok(exam)
    }
}

fn exam_not_found() -> ExamError {
    ExamError::NotFound("exam session".to_string())
}
