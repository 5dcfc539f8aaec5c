// src/handlers/health.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use crate::services::QuizService;

/// Liveness plus cache and session statistics. No authentication.
pub async fn health(State(service): State<Arc<QuizService>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "cache_stats": service.stats(),
    }))
}
