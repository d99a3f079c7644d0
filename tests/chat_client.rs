//! chat-completions 客户端测试
//!
//! 在本地端口上启动一个 axum 桩服务代替上游

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

use page_translator::translation::core::client::translate_with_retry;
use page_translator::translation::pipeline::{Batch, TextUnit, UnitKind};
use page_translator::translation::{
    ChatCompletionsClient, ErrorCategory, RetryPolicy, TranslationClient, TranslationError,
};

/// 桩服务记录收到的请求，并按脚本返回
#[derive(Default)]
struct Stub {
    requests: Mutex<Vec<(Option<String>, Value)>>,
    replies: Mutex<Vec<(StatusCode, String)>>,
}

impl Stub {
    fn with_replies(replies: Vec<(StatusCode, String)>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies),
        })
    }

    fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn stub_handler(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.requests.lock().unwrap().push((auth, body));

    let mut replies = stub.replies.lock().unwrap();
    let (status, body) = if replies.len() > 1 {
        replies.remove(0)
    } else {
        replies[0].clone()
    };
    (status, [("content-type", "application/json")], body).into_response()
}

async fn spawn_stub(stub: Arc<Stub>) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(stub_handler))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1/chat/completions", addr)
}

fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

fn batch() -> Batch {
    let unit = |id: usize, text: &str, tag: &str| TextUnit {
        id,
        original_text: text.to_string(),
        container_tag: tag.to_string(),
        is_visible: true,
        vertical_position: id as f64 * 20.0,
        kind: UnitKind::Text,
    };
    Batch {
        seq: 0,
        units: vec![unit(1, "Hello world", "h1"), unit(2, "Thank you", "p")],
    }
}

fn client(endpoint: &str, key: Option<&str>) -> ChatCompletionsClient {
    ChatCompletionsClient::new(
        endpoint,
        "gpt-4-turbo",
        key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_translates_batch_through_endpoint() {
    let stub = Stub::with_replies(vec![(
        StatusCode::OK,
        completion("[1] <h1> Bonjour le monde\n[2] <p> Merci"),
    )]);
    let endpoint = spawn_stub(stub.clone()).await;

    let result = client(&endpoint, None).translate(&batch(), "fr").await.unwrap();
    assert_eq!(result.get(1), Some("Bonjour le monde"));
    assert_eq!(result.get(2), Some("Merci"));

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert!(auth.is_none(), "未配置凭据时不应发送 Authorization");
    assert_eq!(body["model"], "gpt-4-turbo");
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("to fr."));
    assert!(prompt.contains("[1] <h1> Hello world\n[2] <p> Thank you"));
}

#[tokio::test]
async fn test_configured_key_sent_as_bearer() {
    let stub = Stub::with_replies(vec![(StatusCode::OK, completion("[1] Hallo Welt"))]);
    let endpoint = spawn_stub(stub.clone()).await;

    client(&endpoint, Some("test-key")).translate(&batch(), "de").await.unwrap();
    assert_eq!(stub.requests()[0].0.as_deref(), Some("Bearer test-key"));
}

#[tokio::test]
async fn test_error_status_mapped() {
    let stub = Stub::with_replies(vec![(
        StatusCode::BAD_REQUEST,
        r#"{"error":"bad"}"#.to_string(),
    )]);
    let endpoint = spawn_stub(stub).await;

    let error = client(&endpoint, None).translate(&batch(), "fr").await.unwrap_err();
    assert!(matches!(error, TranslationError::HttpStatus(400, _)));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_missing_content_is_schema_error() {
    let stub = Stub::with_replies(vec![(StatusCode::OK, r#"{"choices":[]}"#.to_string())]);
    let endpoint = spawn_stub(stub).await;

    let error = client(&endpoint, None).translate(&batch(), "fr").await.unwrap_err();
    assert_eq!(error.category(), ErrorCategory::Schema);
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let stub = Stub::with_replies(vec![
        (StatusCode::SERVICE_UNAVAILABLE, "{}".to_string()),
        (StatusCode::OK, completion("[2] Gracias")),
    ]);
    let endpoint = spawn_stub(stub.clone()).await;
    let policy = RetryPolicy {
        max_retries: 2,
        retry_delay: Duration::from_millis(5),
        request_timeout: Duration::from_secs(5),
    };

    let client = client(&endpoint, None);
    let result = translate_with_retry(&client, &batch(), "es", &policy).await.unwrap();
    assert_eq!(result.get(2), Some("Gracias"));
    assert_eq!(result.get(1), None);
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    // 先绑定再释放，得到一个没有监听者的端口
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = format!("http://{}/v1/chat/completions", addr);
    let error = client(&endpoint, None).translate(&batch(), "fr").await.unwrap_err();
    assert!(error.is_retryable());
    assert_eq!(error.category(), ErrorCategory::Network);
}
