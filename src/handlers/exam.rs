// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        answer_record::AnswerRequest,
        exam::{ExamMode, StartExamQuery},
        exam_record::{HistoryQuery, LatestQuery},
        session::LoginSession,
    },
    services::QuizService,
};

/// Starts a practice (default) or mock exam for the caller.
pub async fn start_exam(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
    Query(query): Query<StartExamQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mode = match query.exam_type.as_deref() {
        None | Some("") => ExamMode::default(),
        Some(raw) => raw.parse::<ExamMode>().map_err(AppError::BadRequest)?,
    };

    let started = service.start_exam(session.user_id, mode).await?;
    Ok(Json(started))
}

pub async fn get_exam_session(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = service.exam_session(&session_id, session.user_id).await?;
    Ok(Json(view))
}

pub async fn submit_exam_answer(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
    Path(session_id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    service.submit_exam_answer(&session_id, session.user_id, req.question_id, &req.answer)?;
    Ok(Json(json!({ "message": "Answer submitted successfully" })))
}

/// Grades the exam and removes it. Results are not replayable afterwards.
pub async fn complete_exam(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = service.complete_exam(&session_id, session.user_id).await?;
    Ok(Json(result))
}

pub async fn exam_history(
    State(service): State<Arc<QuizService>>,
    State(config): State<Config>,
    Extension(session): Extension<LoginSession>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(config.history_limit);

    let records = service
        .repository()
        .list_exam_records(session.user_id, limit)
        .await?;

    Ok(Json(json!({
        "total": records.len(),
        "exam_records": records,
    })))
}

/// Most recent exam record of the caller, optionally started after `since`.
pub async fn latest_exam(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
    Query(query): Query<LatestQuery>,
) -> Result<impl IntoResponse, AppError> {
    let since = query.since.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let record = service
        .repository()
        .find_latest_exam_record(session.user_id, since)
        .await?
        .ok_or_else(|| AppError::NotFound("No exam record found".to_string()))?;

    Ok(Json(record))
}
