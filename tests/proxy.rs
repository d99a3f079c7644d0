//! 凭据代理测试

#![cfg(feature = "web")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use page_translator::translation::pipeline::{Batch, TextUnit, UnitKind};
use page_translator::translation::{ChatCompletionsClient, TranslationClient, TranslationError};
use page_translator::web::{create_router, ProxyConfig};

#[derive(Default)]
struct Upstream {
    seen: Mutex<Vec<(Option<String>, Value)>>,
    status: Mutex<Option<StatusCode>>,
}

async fn upstream_handler(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    upstream.seen.lock().unwrap().push((auth, body));

    let status = upstream.status.lock().unwrap().unwrap_or(StatusCode::OK);
    if status != StatusCode::OK {
        return (status, Json(json!({"error": {"message": "slow down"}}))).into_response();
    }
    Json(json!({"choices": [{"message": {"role": "assistant", "content": "[0] Bonjour"}}]}))
        .into_response()
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start(upstream: Arc<Upstream>) -> String {
    let upstream_base = serve(
        Router::new()
            .route("/v1/chat/completions", post(upstream_handler))
            .with_state(upstream),
    )
    .await;

    let config = ProxyConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: 7080,
        upstream_url: format!("{}/v1/chat/completions", upstream_base),
        upstream_api_key: "upstream-secret".to_string(),
        model: "pinned-model".to_string(),
        upstream_timeout: Duration::from_secs(5),
    };
    serve(create_router(&config).unwrap()).await
}

fn batch() -> Batch {
    Batch {
        seq: 0,
        units: vec![TextUnit {
            id: 0,
            original_text: "Good morning".to_string(),
            container_tag: "p".to_string(),
            is_visible: true,
            vertical_position: 0.0,
            kind: UnitKind::Text,
        }],
    }
}

fn client(proxy: &str) -> ChatCompletionsClient {
    ChatCompletionsClient::new(
        &format!("{}/v1/chat/completions", proxy),
        "client-model",
        None,
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_proxy_attaches_credential_and_pins_model() {
    let upstream = Arc::new(Upstream::default());
    let proxy = start(upstream.clone()).await;

    let result = client(&proxy).translate(&batch(), "fr").await.unwrap();
    assert_eq!(result.get(0), Some("Bonjour"));

    let seen = upstream.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("Bearer upstream-secret"));
    assert_eq!(seen[0].1["model"], "pinned-model");
    assert_eq!(seen[0].1["messages"][1]["role"], "user");
}

#[tokio::test]
async fn test_proxy_relays_upstream_status() {
    let upstream = Arc::new(Upstream::default());
    *upstream.status.lock().unwrap() = Some(StatusCode::TOO_MANY_REQUESTS);
    let proxy = start(upstream).await;

    let error = client(&proxy).translate(&batch(), "fr").await.unwrap_err();
    assert!(matches!(error, TranslationError::HttpStatus(429, _)));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_health_and_request_validation() {
    let proxy = start(Arc::new(Upstream::default())).await;
    let http = reqwest::Client::new();

    let health: Value = http
        .get(format!("{}/health", proxy))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));

    let response = http
        .post(format!("{}/v1/chat/completions", proxy))
        .json(&json!({"model": "anything"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
