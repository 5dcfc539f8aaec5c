// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, UserResponse},
    services::QuizService,
    utils::{
        auth::bearer_token,
        hash::{hash_password, verify_password},
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user (excluding password).
pub async fn register(
    State(service): State<Arc<QuizService>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = service
        .repository()
        .create_user(&payload.username, &hashed_password)
        .await
        .map_err(|e| {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::Conflict(format!("Username '{}' already exists", payload.username)))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": UserResponse { id: user.id, username: user.username },
        })),
    ))
}

/// Authenticates a user and opens a login session.
///
/// Three consecutive failures lock the account for five minutes; a
/// successful login resets the counter.
pub async fn login(
    State(service): State<Arc<QuizService>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let repo = service.repository();
    let user = repo
        .find_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    let now = Utc::now();
    if user.is_locked(now) {
        return Err(AppError::TooManyRequests(
            "Account is temporarily locked due to too many failed login attempts".to_string(),
        ));
    }

    if !verify_password(&payload.password, &user.password)? {
        let (attempts, locked_until) = user.after_failed_login(now);
        repo.save_login_state(user.id, attempts, locked_until).await?;
        if locked_until.is_some() {
            tracing::warn!(user_id = user.id, "Account locked after {} failed logins", attempts);
        }
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    if user.login_attempts != 0 || user.locked_until.is_some() {
        repo.save_login_state(user.id, 0, None).await?;
    }

    let session_id = service.open_session(user.id, &user.username);

    Ok(Json(json!({
        "message": "Login successful",
        "session_id": session_id,
        "type": "Bearer",
        "user": UserResponse { id: user.id, username: user.username },
    })))
}

/// Ends the caller's login session. Logging out twice is not an error.
pub async fn logout(
    State(service): State<Arc<QuizService>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let message = match bearer_token(&headers) {
        Some(token) if service.close_session(token) => "Logout successful",
        _ => "Already logged out",
    };
    Json(json!({ "message": message }))
}
