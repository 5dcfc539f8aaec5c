// tests/api_tests.rs

use quiz_backend::{
    config::Config, models::question::QuestionType, routes, state::AppState,
    store::MemoryRepository,
};
use std::sync::Arc;

struct TestApp {
    address: String,
    repo: Arc<MemoryRepository>,
    state: AppState,
}

/// Helper function to spawn the app on a random port for testing.
/// Backed by the in-memory repository, so no database is needed.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    repo.seed(QuestionType::Single, "network", 30, "A");
    repo.seed(QuestionType::Multiple, "storage", 10, "A,C");
    repo.seed(QuestionType::Judge, "security", 10, "正确");

    let state = AppState::new(repo.clone(), Config::for_tests());
    let app = routes::create_router(state.clone());

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, repo, state }
}

/// Registers a fresh user and returns its session token.
async fn register_and_login(address: &str, client: &reqwest::Client) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let register = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["session_id"]
        .as_str()
        .expect("Session id not found")
        .to_string()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let body = serde_json::json!({ "username": "duplicate", "password": "password123" });

    let first = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn protected_routes_require_session() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/api/user/profile", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let bogus = client
        .get(format!("{}/api/user/profile", app.address))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(bogus.status().as_u16(), 401);
}

#[tokio::test]
async fn login_logout_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&app.address, &client).await;
    assert_eq!(token.len(), 64);

    let profile = client
        .get(format!("{}/api/user/profile", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(profile.status().as_u16(), 200);

    let logout = client
        .post(format!("{}/api/auth/logout", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status().as_u16(), 200);

    let after = client
        .get(format!("{}/api/user/profile", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status().as_u16(), 401);
}

#[tokio::test]
async fn repeated_bad_passwords_lock_account() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap();

    for _ in 0..3 {
        let response = client
            .post(format!("{}/api/auth/login", app.address))
            .json(&serde_json::json!({ "username": username, "password": "wrong-password" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    // Even the right password is refused while locked.
    let locked = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status().as_u16(), 429);
}

#[tokio::test]
async fn question_lookup_hides_answer_and_counts_cache() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&app.address, &client).await;

    let listed: serde_json::Value = client
        .get(format!("{}/api/questions?category=storage&limit=5", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["total"], 5);
    let id = listed["questions"][0]["id"].as_i64().unwrap();
    assert_eq!(listed["questions"][0]["type"], "multiple");

    let single: serde_json::Value = client
        .get(format!("{}/api/questions/{}", app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(single["question"]["id"], id);
    assert!(single["question"].get("answer").is_none());

    // Listing filled the cache, so the single lookup was a hit.
    assert!(app.state.service.stats().question_hits >= 1);

    let missing = client
        .get(format!("{}/api/questions/999999", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn standalone_answer_is_graded_immediately() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&app.address, &client).await;
    let question_id = app.repo.seed(QuestionType::Multiple, "storage", 1, "B,D")[0];

    let feedback: serde_json::Value = client
        .post(format!("{}/api/questions/submit", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "question_id": question_id, "answer": "d, b" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(feedback["is_correct"], true);
    assert_eq!(feedback["correct_answer"], "B,D");
    assert_eq!(app.repo.answer_records().len(), 1);
}

#[tokio::test]
async fn health_reports_cache_stats() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let _token = register_and_login(&app.address, &client).await;

    let health: serde_json::Value = client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "ok");
    assert_eq!(health["cache_stats"]["session_count"], 1);
    assert_eq!(health["cache_stats"]["exam_count"], 0);
}

#[tokio::test]
async fn categories_report_counts_and_total() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&app.address, &client).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/questions/categories", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["total"], 50);
    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 3);
    assert_eq!(categories[0]["name"], "network");
    assert_eq!(categories[0]["count"], 30);
}

#[tokio::test]
async fn search_filters_by_keyword_type_and_limit() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&app.address, &client).await;
    let url = format!("{}/api/questions/search", app.address);

    let all: serde_json::Value = client
        .get(&url)
        .bearer_auth(&token)
        .query(&[("keyword", "storage")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["total"], 10);
    assert_eq!(all["keyword"], "storage");
    assert!(all["questions"][0].get("answer").is_none());

    let limited: serde_json::Value = client
        .get(&url)
        .bearer_auth(&token)
        .query(&[("keyword", "question"), ("type", "judge"), ("limit", "3")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(limited["total"], 3);
    assert!(
        limited["questions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|q| q["type"] == "judge")
    );

    let missing = client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 400);
}

#[tokio::test]
async fn user_stats_and_wrong_questions_follow_answers() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&app.address, &client).await;
    let ids = app.repo.seed(QuestionType::Single, "os", 2, "C");

    for (question_id, answer) in [(ids[0], "C"), (ids[1], "A")] {
        let response = client
            .post(format!("{}/api/questions/submit", app.address))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "question_id": question_id, "answer": answer }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let stats: serde_json::Value = client
        .get(format!("{}/api/user/stats", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_answered"], 2);
    assert_eq!(stats["correct_count"], 1);
    assert_eq!(stats["accuracy"].as_f64().unwrap(), 50.0);
    assert_eq!(stats["category_stats"][0]["category"], "os");

    let wrong: serde_json::Value = client
        .get(format!("{}/api/questions/wrong", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(wrong["total"], 1);
    assert_eq!(wrong["wrong_questions"][0]["question_id"], ids[1]);
    assert_eq!(wrong["wrong_questions"][0]["user_answer"], "A");
    assert_eq!(wrong["wrong_questions"][0]["correct_answer"], "C");

    let profile: serde_json::Value = client
        .get(format!("{}/api/user/profile", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["stats"]["total_answered"], 2);
}
