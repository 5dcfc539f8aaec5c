// src/services/stats.rs

//! Question bank overview, keyword search and per-user answering statistics.

use crate::{
    config::WRONG_ANSWER_LIMIT,
    error::ExamError,
    models::{
        question::{Question, QuestionFilter},
        stats::{QuestionStats, UserStats, WrongAnswer},
    },
    services::QuizService,
};

/// Percentage of correct answers; 0 when nothing was answered.
fn accuracy(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

impl QuizService {
    pub async fn question_stats(&self) -> Result<QuestionStats, ExamError> {
        let categories = self.repo.count_questions_by_category().await?;
        let total = categories.iter().map(|c| c.count).sum();
        Ok(QuestionStats { total, categories })
    }

    /// Questions whose content contains `keyword`; results are cached.
    pub async fn search_questions(
        &self,
        keyword: &str,
        filter: &QuestionFilter,
        limit: i64,
    ) -> Result<Vec<Question>, ExamError> {
        let questions = self.repo.search_questions(keyword, filter, limit).await?;
        self.cache.put_many(questions.iter().cloned());
        Ok(questions)
    }

    /// The user's most recent wrong answers.
    pub async fn wrong_answers(&self, user_id: i64) -> Result<Vec<WrongAnswer>, ExamError> {
        Ok(self.repo.find_wrong_answers(user_id, WRONG_ANSWER_LIMIT).await?)
    }

    /// Totals, accuracy overall and per category, and recent wrong answers.
    pub async fn user_stats(&self, user_id: i64) -> Result<UserStats, ExamError> {
        let mut category_stats = self.repo.answer_stats_by_category(user_id).await?;
        for stats in &mut category_stats {
            stats.accuracy = accuracy(stats.correct, stats.total);
        }

        let total_answered = category_stats.iter().map(|s| s.total).sum();
        let correct_count = category_stats.iter().map(|s| s.correct).sum();

        Ok(UserStats {
            total_answered,
            correct_count,
            accuracy: accuracy(correct_count, total_answered),
            category_stats,
            wrong_questions: self.wrong_answers(user_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::{question::QuestionType, session::LoginSession},
        store::MemoryRepository,
    };
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn test_accuracy_guards_empty_history() {
        assert_eq!(accuracy(0, 0), 0.0);
        assert_eq!(accuracy(1, 4), 25.0);
    }

    #[tokio::test]
    async fn test_question_stats_totals_categories() {
        let repo = Arc::new(MemoryRepository::new());
        repo.seed(QuestionType::Single, "network", 3, "A");
        repo.seed(QuestionType::Judge, "security", 2, "正确");
        let service = QuizService::new(repo, &Config::for_tests());

        let stats = service.question_stats().await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.categories.len(), 2);
        assert_eq!(stats.categories[0].name, "network");
        assert_eq!(stats.categories[0].count, 3);
    }

    #[tokio::test]
    async fn test_user_stats_from_answers() {
        let repo = Arc::new(MemoryRepository::new());
        let network = repo.seed(QuestionType::Single, "network", 2, "A");
        let storage = repo.seed(QuestionType::Multiple, "storage", 2, "A,C");
        let service = QuizService::new(repo.clone(), &Config::for_tests());
        let session = LoginSession::new(5, "erin", Utc::now());

        service.check_answer(&session, network[0], "A").await.unwrap();
        service.check_answer(&session, network[1], "B").await.unwrap();
        service.check_answer(&session, storage[0], "C,A").await.unwrap();
        service.check_answer(&session, storage[1], "A").await.unwrap();

        let stats = service.user_stats(5).await.unwrap();
        assert_eq!(stats.total_answered, 4);
        assert_eq!(stats.correct_count, 2);
        assert_eq!(stats.accuracy, 50.0);
        assert_eq!(stats.category_stats.len(), 2);
        assert!(stats.category_stats.iter().all(|c| c.accuracy == 50.0));
        assert_eq!(stats.wrong_questions.len(), 2);

        // Other users see nothing.
        let empty = service.user_stats(6).await.unwrap();
        assert_eq!(empty.total_answered, 0);
        assert_eq!(empty.accuracy, 0.0);
    }
}
