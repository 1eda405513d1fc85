use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use taskboard_server::auth::AuthState;
use taskboard_server::config::Config;
use taskboard_server::task::api::v1::TaskState;
use taskboard_server::web::create_api_router;

mod common;

async fn setup() -> anyhow::Result<axum::Router> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let db = common::setup_db().await?;
    let config = Config {
        db_url: "".to_string(),
        port: 8080,
        jwt_secret: "test_secret".to_string(),
        admin_username: "admin".to_string(),
        admin_password: "password".to_string(),
    };
    let auth_state = Arc::new(AuthState::from_config(&config));
    let task_state = Arc::new(TaskState { db: Arc::new(db) });
    Ok(create_api_router(auth_state, task_state))
}

async fn send_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body was not JSON")
    };
    (status, value)
}

#[tokio::test]
async fn login_issues_a_usable_token() {
    let app = setup().await.expect("Failed to setup test app");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/login",
        Some(json!({"username": "admin", "password": "password"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("Expected a token");

    // The issued token grants access to the task routes.
    let (status, tasks) = send_json(&app, Method::GET, "/api/v1/tasks", None, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn login_rejects_invalid_credentials() {
    let app = setup().await.expect("Failed to setup test app");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/login",
        Some(json!({"username": "admin", "password": "wrong"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn openapi_document_is_public() {
    let app = setup().await.expect("Failed to setup test app");

    let (status, body) = send_json(&app, Method::GET, "/api/v1/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/tasks"].is_object());
}
