use std::net::SocketAddr;
use std::sync::Arc;

use email_classifier::server::{self, AppState, ErrorResponse, HealthResponse, PredictResponse};
use email_classifier::{Dataset, ModelStore, Pipeline};
use reqwest::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;

async fn spawn_app(model: Option<Arc<Pipeline>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(AppState::new(model));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn sample_model() -> Option<Arc<Pipeline>> {
    Some(Arc::new(Pipeline::builder().fit(&Dataset::sample()).unwrap()))
}

async fn post_raw(addr: SocketAddr, body: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{}/predict", addr))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_valid_request_returns_probabilities() {
    let model = sample_model();
    let classes = model.as_ref().unwrap().classes().to_vec();
    let addr = spawn_app(model).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/predict", addr))
        .json(&json!({ "email_text": "URGENT! You have won a free prize, click here to claim" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: PredictResponse = response.json().await.unwrap();
    assert_eq!(body.predicted_label, "spam");
    let keys: Vec<String> = body.confidence_scores.keys().cloned().collect();
    assert_eq!(keys, classes);
    let total: f64 = body.confidence_scores.values().sum();
    assert!((total - 1.0).abs() < 1e-6, "probabilities summed to {}", total);
}

#[tokio::test]
async fn test_missing_field_returns_400() {
    let addr = spawn_app(sample_model()).await;
    let response = post_raw(addr, r#"{"subject": "hello"}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "Missing \"email_text\" key in JSON payload.");
}

#[tokio::test]
async fn test_non_string_field_returns_400() {
    let addr = spawn_app(sample_model()).await;
    for body in [r#"{"email_text": 12}"#, r#"{"email_text": {"body": "hi"}}"#, r#"{"email_text": true}"#] {
        let response = post_raw(addr, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let error: ErrorResponse = response.json().await.unwrap();
        assert_eq!(error.error, "\"email_text\" must be a string.");
    }
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let addr = spawn_app(sample_model()).await;
    let response = post_raw(addr, r#"{"email_text": "unterminated"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(body.error.starts_with("Invalid JSON format:"), "{}", body.error);
}

#[tokio::test]
async fn test_body_over_two_mib_is_classified() {
    let addr = spawn_app(sample_model()).await;
    let body = json!({ "email_text": "hello meeting tomorrow ".repeat(100_000) }).to_string();
    assert!(body.len() > 2 * 1024 * 1024);

    let response = post_raw(addr, &body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: PredictResponse = response.json().await.unwrap();
    assert_eq!(body.predicted_label, "ham");
}

#[tokio::test]
async fn test_unloaded_model_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let model = server::load_model(&dir.path().join("missing.json"));
    assert!(model.is_none());
    let addr = spawn_app(model).await;

    for body in [r#"{"email_text": "hello"}"#, "{}", "garbage"] {
        let response = post_raw(addr, body).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = response.json().await.unwrap();
        assert_eq!(error.error, "Model is not loaded. Check server logs.");
    }

    let health: HealthResponse = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!health.model_loaded);
}

#[tokio::test]
async fn test_errors_do_not_affect_later_requests() {
    let addr = spawn_app(sample_model()).await;
    assert_eq!(post_raw(addr, "nope").await.status(), StatusCode::BAD_REQUEST);
    let response = post_raw(addr, r#"{"email_text": "Can you pick up groceries?"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: PredictResponse = response.json().await.unwrap();
    assert_eq!(body.predicted_label, "ham");
}

#[tokio::test]
async fn test_model_loaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    ModelStore::new(&path)
        .save(&Pipeline::builder().fit(&Dataset::sample()).unwrap())
        .unwrap();

    let addr = spawn_app(server::load_model(&path)).await;
    let health: HealthResponse = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(health.model_loaded);
    assert_eq!(post_raw(addr, r#"{"email_text": ""}"#).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_routing_defaults() {
    let addr = spawn_app(sample_model()).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("http://{}/predict", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = client.post(format!("http://{}/classify", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
