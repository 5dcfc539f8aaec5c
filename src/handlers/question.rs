// src/handlers/question.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        answer_record::AnswerRequest,
        question::{PublicQuestion, QuestionFilter, QuestionQuery},
        session::LoginSession,
        stats::SearchQuery,
    },
    services::QuizService,
};

/// Lists questions by category and/or type.
///
/// Without a category the selection is random, matching practice browsing.
pub async fn list_questions(
    State(service): State<Arc<QuizService>>,
    State(config): State<Config>,
    Query(query): Query<QuestionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(config.question_limit);

    let questions = match query.category {
        Some(category) => {
            let filter = QuestionFilter {
                category: Some(category),
                question_type: query.question_type,
            };
            service.find_questions(&filter, limit).await?
        }
        None => service.sample_questions(query.question_type, limit).await?,
    };

    let public: Vec<PublicQuestion> = questions.iter().map(PublicQuestion::from).collect();
    Ok(Json(json!({
        "total": public.len(),
        "questions": public,
    })))
}

/// Returns one question from the cache (or the store on a miss).
pub async fn get_question(
    State(service): State<Arc<QuizService>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = service.question(id).await?;
    Ok(Json(json!({ "question": PublicQuestion::from(question.as_ref()) })))
}

/// Question count per category and overall.
pub async fn list_categories(
    State(service): State<Arc<QuizService>>,
) -> Result<impl IntoResponse, AppError> {
    let stats = service.question_stats().await?;
    Ok(Json(json!({
        "categories": stats.categories,
        "total": stats.total,
    })))
}

/// Searches question content for a keyword, optionally by category and type.
pub async fn search_questions(
    State(service): State<Arc<QuizService>>,
    State(config): State<Config>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let keyword = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search keyword is required".to_string()))?;

    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(config.search_limit);
    let filter = QuestionFilter {
        category: query.category.clone().filter(|c| !c.is_empty()),
        question_type: query.question_type,
    };

    let questions = service.search_questions(keyword, &filter, limit).await?;
    let public: Vec<PublicQuestion> = questions.iter().map(PublicQuestion::from).collect();
    Ok(Json(json!({
        "questions": public,
        "total": public.len(),
        "keyword": keyword,
    })))
}

/// The caller's most recent wrong answers.
pub async fn wrong_questions(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
) -> Result<impl IntoResponse, AppError> {
    let wrong = service.wrong_answers(session.user_id).await?;
    Ok(Json(json!({
        "total": wrong.len(),
        "wrong_questions": wrong,
    })))
}

/// Grades a standalone answer immediately.
pub async fn submit_answer(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let feedback = service
        .check_answer(&session, req.question_id, &req.answer)
        .await?;
    Ok(Json(feedback))
}
