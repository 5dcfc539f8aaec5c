// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, exam, health, question, user},
    state::AppState,
    utils::auth::session_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, user, questions, exam).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (quiz service and config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let require_session = middleware::from_fn_with_state(state.clone(), session_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let user_routes = Router::new()
        .route("/profile", get(user::profile))
        .route("/stats", get(user::stats))
        .layer(require_session.clone());

    let question_routes = Router::new()
        .route("/", get(question::list_questions))
        .route("/categories", get(question::list_categories))
        .route("/search", get(question::search_questions))
        .route("/wrong", get(question::wrong_questions))
        .route("/{id}", get(question::get_question))
        .route("/submit", post(question::submit_answer))
        .layer(require_session.clone());

    // Static segments take precedence over `{session_id}`.
    let exam_routes = Router::new()
        .route("/start", post(exam::start_exam))
        .route("/history", get(exam::exam_history))
        .route("/latest", get(exam::latest_exam))
        .route("/{session_id}", get(exam::get_exam_session))
        .route("/{session_id}/answer", post(exam::submit_exam_answer))
        .route("/{session_id}/complete", post(exam::complete_exam))
        .layer(require_session);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/user", user_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/exam", exam_routes)
        .route("/api/health", get(health::health))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, store::MemoryRepository};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::new(Arc::new(MemoryRepository::new()), Config::for_tests()))
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_exam_routes_require_session() {
        let response = app()
            .oneshot(Request::post("/api/exam/start").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
