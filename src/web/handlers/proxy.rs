//! chat-completions 转发
//!
//! 客户端请求不带凭据；代理固定模型、附上上游凭据后原样转发，
//! 并把上游的状态码和响应体交回客户端。

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::web::types::{AppState, ErrorResponse};

pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<Value>,
) -> Response {
    let Some(object) = body.as_object_mut() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            "request body must be a JSON object",
        );
    };

    if !object.get("messages").map(Value::is_array).unwrap_or(false) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            "request body must contain a messages array",
        );
    }

    if let Some(requested) = object.get("model").and_then(Value::as_str) {
        if requested != state.config.model {
            tracing::debug!("客户端请求模型 {}，改用 {}", requested, state.config.model);
        }
    }
    object.insert("model".to_string(), Value::String(state.config.model.clone()));

    let upstream = state
        .http
        .post(&state.config.upstream_url)
        .bearer_auth(&state.config.upstream_api_key)
        .json(&body)
        .send()
        .await;

    let response = match upstream {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            tracing::warn!("上游请求超时: {}", e);
            return error_response(
                StatusCode::GATEWAY_TIMEOUT,
                "upstream_timeout",
                "upstream timed out",
            );
        }
        Err(e) => {
            tracing::error!("上游请求失败: {}", e);
            return error_response(
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream unreachable",
            );
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let bytes: Bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("读取上游响应失败: {}", e);
            return error_response(
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream body unreadable",
            );
        }
    };

    if status.is_success() {
        tracing::debug!("上游响应 {} ({} 字节)", status, bytes.len());
    } else {
        tracing::warn!("上游返回 {}", status);
    }

    (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

fn error_response(status: StatusCode, kind: &'static str, message: &str) -> Response {
    (status, Json(ErrorResponse::new(kind, message))).into_response()
}
