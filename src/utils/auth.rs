// src/utils/auth.rs

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::QuizService};

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Axum Middleware: Authentication.
///
/// Resolves the bearer token through the session store (refreshing its last
/// activity) and injects the `LoginSession` into the request extensions.
/// Unknown or missing tokens get 401 Unauthorized.
pub async fn session_middleware(
    State(service): State<Arc<QuizService>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::AuthError("No session found".to_string()))?;

    let session = service
        .session(token)
        .ok_or_else(|| AppError::AuthError("Invalid session".to_string()))?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
