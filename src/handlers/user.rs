// src/handlers/user.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    error::AppError,
    models::{session::LoginSession, user::UserResponse},
    services::QuizService,
};

/// Identity of the current session with its answering statistics.
pub async fn profile(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
) -> Result<impl IntoResponse, AppError> {
    let stats = service.user_stats(session.user_id).await?;

    Ok(Json(json!({
        "user": UserResponse { id: session.user_id, username: session.username.clone() },
        "session": session,
        "stats": stats,
    })))
}

/// Answer totals, accuracy overall and per category, recent wrong answers.
pub async fn stats(
    State(service): State<Arc<QuizService>>,
    Extension(session): Extension<LoginSession>,
) -> Result<impl IntoResponse, AppError> {
    let stats = service.user_stats(session.user_id).await?;
    Ok(Json(stats))
}
