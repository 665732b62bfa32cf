use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use trackarr::config::Config;

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // One connection so every query sees the same in-memory database
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.auth.jwt_secret = "test-secret".to_string();
    // Cheap argon2 params keep the suite fast
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> Router {
    spawn_app_with_config(test_config()).await
}

async fn spawn_app_with_config(config: Config) -> Router {
    let store = trackarr::db::Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
    .expect("Failed to open in-memory store");

    let state = trackarr::api::create_app_state_with_store(config, store)
        .expect("Failed to create app state");
    trackarr::api::router(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, serde_json::Value) {
    request(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, serde_json::Value) {
    request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await
}

fn movie_payload(media_id: &str) -> serde_json::Value {
    serde_json::json!({
        "media_type": "movie",
        "media_id": media_id,
        "title": "The Shawshank Redemption",
        "poster_path": "/poster.jpg",
        "release_date": "1994-09-23",
        "status": "completed",
        "current_episode": 0
    })
}

#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;

    let (status, body) = register(&app, "alice", "Passw0rd1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"]["id"].is_number());
    assert!(body["data"]["created_at"].is_string());
    // The password hash never leaves the server
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = login(&app, "alice", "Passw0rd1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["access_token"].is_string());
    assert!(body["data"]["refresh_token"].is_string());
    assert_eq!(body["data"]["expires_in"], 3600);
}

#[tokio::test]
async fn test_register_validation_aggregates_violations() {
    let app = spawn_app().await;

    // Bad username and a password missing several rules at once
    let (status, body) = register(&app, "a!", "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Username"));
    assert!(error.contains("8 characters"));
    assert!(error.contains("uppercase"));
    assert!(error.contains("number"));
}

#[tokio::test]
async fn test_duplicate_registration_conflict() {
    let app = spawn_app().await;

    let (status, _) = register(&app, "bob", "Passw0rd1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, "bob", "0therPassw0rd").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_does_not_reveal_which_part_failed() {
    let app = spawn_app().await;

    register(&app, "carol", "Passw0rd1").await;

    let (status, unknown_user) = login(&app, "nobody", "Passw0rd1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, wrong_password) = login(&app, "carol", "WrongPass1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(unknown_user["error"], wrong_password["error"]);
}

#[tokio::test]
async fn test_middleware_gate() {
    let app = spawn_app().await;

    let (status, _) = request(&app, "GET", "/api/watched/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Parseable header shape but not a Bearer scheme
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/watched/1")
                .header("Authorization", "Token abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Well-formed header carrying garbage
    let (status, _) = request(&app, "GET", "/api/watched/1", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_token_rejected_on_protected_route() {
    let app = spawn_app().await;

    register(&app, "dave", "Passw0rd1").await;
    let (_, body) = login(&app, "dave", "Passw0rd1").await;
    let refresh = body["data"]["refresh_token"].as_str().unwrap();

    // Valid signature, wrong token type
    let (status, _) = request(&app, "GET", "/api/watched/1", Some(refresh), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_watched_crud() {
    let app = spawn_app().await;

    register(&app, "erin", "Passw0rd1").await;
    let (_, body) = login(&app, "erin", "Passw0rd1").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        "POST",
        "/api/watched",
        Some(&token),
        Some(movie_payload("tt0111161")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["data"]["id"].as_i64().unwrap();

    // Same media id twice is a conflict
    let (status, _) = request(
        &app,
        "POST",
        "/api/watched",
        Some(&token),
        Some(movie_payload("tt0111161")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Full overwrite update
    let mut update = movie_payload("tt0111161");
    update["status"] = serde_json::json!("watching");
    update["current_episode"] = serde_json::json!(3);
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/watched/{item_id}"),
        Some(&token),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "watching");
    assert_eq!(body["data"]["current_episode"], 3);

    let (status, _) = request(
        &app,
        "PUT",
        "/api/watched/99999",
        Some(&token),
        Some(movie_payload("tt0111161")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/watched/{user_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/watched/{item_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/watched/{item_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_watched_item_payload_validation() {
    let app = spawn_app().await;

    register(&app, "frank", "Passw0rd1").await;
    let (_, body) = login(&app, "frank", "Passw0rd1").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let mut payload = movie_payload("tt0111161");
    payload["media_type"] = serde_json::json!("podcast");
    payload["title"] = serde_json::json!("");

    let (status, body) = request(&app, "POST", "/api/watched", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error = body["error"].as_str().unwrap();
    assert!(error.contains("media_type"));
    assert!(error.contains("title"));
}

#[tokio::test]
async fn test_watched_ownership_scoping() {
    let app = spawn_app().await;

    register(&app, "grace", "Passw0rd1").await;
    let (_, body) = login(&app, "grace", "Passw0rd1").await;
    let grace_token = body["data"]["access_token"].as_str().unwrap().to_string();

    register(&app, "henry", "Passw0rd1").await;
    let (_, body) = login(&app, "henry", "Passw0rd1").await;
    let henry_token = body["data"]["access_token"].as_str().unwrap().to_string();

    let (_, body) = request(
        &app,
        "POST",
        "/api/watched",
        Some(&grace_token),
        Some(movie_payload("tt0111161")),
    )
    .await;
    let item_id = body["data"]["id"].as_i64().unwrap();

    // Another user cannot overwrite the item
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/watched/{item_id}"),
        Some(&henry_token),
        Some(movie_payload("tt0111161")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Delete is scoped by owner, so it reports not-found for others
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/watched/{item_id}"),
        Some(&henry_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Still there for its owner
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/watched/{item_id}"),
        Some(&grace_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_flow() {
    let app = spawn_app().await;

    register(&app, "iris", "Passw0rd1").await;
    let (_, body) = login(&app, "iris", "Passw0rd1").await;
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();
    let access = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(serde_json::json!({ "token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let new_access = body["data"]["token"].as_str().unwrap().to_string();
    let (status, _) = request(&app, "GET", "/api/watched/1", Some(&new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // An access token cannot be exchanged for another access token
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(serde_json::json!({ "token": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = spawn_app().await;

    register(&app, "judy", "Passw0rd1").await;
    let (_, body) = login(&app, "judy", "Passw0rd1").await;
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/logout",
        None,
        Some(serde_json::json!({ "token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The revoked token no longer mints access tokens
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/refresh-token",
        None,
        Some(serde_json::json!({ "token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging out twice is fine
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/logout",
        None,
        Some(serde_json::json!({ "token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_access_token_rejected() {
    let mut config = test_config();
    config.auth.access_token_ttl = "0s".to_string();
    let app = spawn_app_with_config(config).await;

    register(&app, "kate", "Passw0rd1").await;
    let (_, body) = login(&app, "kate", "Passw0rd1").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    let (status, _) = request(&app, "GET", "/api/watched/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_example_scenario() {
    let app = spawn_app().await;

    let (status, body) = register(&app, "alice_01", "Passw0rd1").await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = login(&app, "alice_01", "Passw0rd1").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/watched/{user_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));

    let (status, _) = request(
        &app,
        "POST",
        "/api/watched",
        Some(&token),
        Some(movie_payload("tt0111161")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = request(
        &app,
        "POST",
        "/api/watched",
        Some(&token),
        Some(movie_payload("tt0111161")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/watched/{user_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
