#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use common::{Reply, ScriptedProvider, FENCED_REPLY};
use serde_json::{json, Value};

async fn spawn_server(provider: &ScriptedProvider) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = fact_or_opinion::api::router(Arc::new(provider.evaluator()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_check() {
    let base = spawn_server(&ScriptedProvider::new([])).await;
    let body = reqwest::get(format!("{base}/health")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn evaluate_returns_evaluation_json() {
    let provider = ScriptedProvider::new([Reply::Text(FENCED_REPLY)]);
    let base = spawn_server(&provider).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/v1/evaluate"))
        .json(&json!({"text": "The sky is blue."}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["facts"][0]["text"], "The sky is blue.");
    assert_eq!(body["opinions"][0]["confidence"], 0.9);
}

#[tokio::test]
async fn invalid_model_output_is_422() {
    let provider = ScriptedProvider::new([Reply::Text("I cannot help with that.")]);
    let base = spawn_server(&provider).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/v1/evaluate"))
        .json(&json!({"text": "anything"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("malformed payload"));
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn blank_text_is_400() {
    let base = spawn_server(&ScriptedProvider::new([])).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/v1/evaluate"))
        .json(&json!({"text": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn normalize_validates_without_model_call() {
    let provider = ScriptedProvider::new([]);
    let base = spawn_server(&provider).await;
    let client = reqwest::Client::new();

    let ok = client
        .post(format!("{base}/v1/normalize"))
        .json(&json!({"raw": "```json\n{\"facts\":[]}\n```"}))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    assert_eq!(ok.json::<Value>().await.unwrap(), json!({"facts": [], "opinions": []}));

    let bad = client
        .post(format!("{base}/v1/normalize"))
        .json(&json!({"raw": "{\"facts\":[{\"text\":\"X\",\"confidence\":1.5}]}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 422);
    assert_eq!(provider.calls(), 0);
}
