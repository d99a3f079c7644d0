//! 翻译服务客户端
//!
//! 每个批次发出一个 chat-completions 请求，并把响应解析为按 id 索引的译文。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};

use super::prompt::{build_prompt, parse_response, BatchTranslation, SYSTEM_PROMPT};
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::pipeline::Batch;

/// 批次翻译接口
#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// 翻译一个批次；失败只影响本批次
    async fn translate(
        &self,
        batch: &Batch,
        target_language: &str,
    ) -> TranslationResult<BatchTranslation>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// 错误响应体最多保留的字符数
const ERROR_BODY_LIMIT: usize = 512;

/// chat-completions 客户端
///
/// 默认端点是凭据代理，此时不发送任何凭据；直连上游时凭据来自环境。
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> TranslationResult<Self> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| helpers::config_error(format!("端点无效 {}: {}", endpoint, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(helpers::config_error(format!("端点必须使用 http(s): {}", endpoint)));
        }

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| helpers::config_error(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        Self::new(
            &config.api_url,
            &config.model,
            config.api_key.clone(),
            config.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers(&self) -> TranslationResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = &self.api_key {
            let auth = format!("Bearer {}", key.trim());
            let mut value = HeaderValue::from_str(&auth)
                .map_err(|_| helpers::config_error("API 凭据包含非法字符"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    fn request_body(&self, batch: &Batch, target_language: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(batch, target_language),
                },
            ],
        }
    }
}

#[async_trait]
impl TranslationClient for ChatCompletionsClient {
    async fn translate(
        &self,
        batch: &Batch,
        target_language: &str,
    ) -> TranslationResult<BatchTranslation> {
        let body = self.request_body(batch, target_language);

        let response = self
            .http
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let text: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(TranslationError::HttpStatus(status.as_u16(), text));
        }

        let bytes = response.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| helpers::schema_error(format!("响应不是预期的 JSON: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| helpers::schema_error("响应缺少 choices[0].message.content"))?;

        Ok(parse_response(&content, batch))
    }
}

/// 单批次的超时与重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 首次失败后的最大重试次数
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_retries: config.retry_attempts(),
            retry_delay: config.retry_delay(),
            request_timeout: config.request_timeout(),
        }
    }

    /// 第 `attempt` 次重试前的等待时间（指数退避）
    pub fn backoff(&self, attempt: usize) -> Duration {
        self.retry_delay * 2_u32.saturating_pow(attempt.min(16) as u32)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationConfig::default())
    }
}

/// 带超时和重试的批次翻译
///
/// 只有可重试错误（网络、超时、5xx、429）才会重试。
pub async fn translate_with_retry(
    client: &dyn TranslationClient,
    batch: &Batch,
    target_language: &str,
    policy: &RetryPolicy,
) -> TranslationResult<BatchTranslation> {
    let mut attempt = 0;

    loop {
        let request = client.translate(batch, target_language);
        let outcome = match timeout(policy.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(TranslationError::TimeoutError(format!(
                "批次 #{} 处理超时: {:.1}秒",
                batch.seq,
                policy.request_timeout.as_secs_f32()
            ))),
        };

        match outcome {
            Ok(translation) => {
                if attempt > 0 {
                    tracing::info!("批次 #{} 在第 {} 次重试后成功", batch.seq, attempt);
                }
                return Ok(translation);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                tracing::warn!(
                    "批次 #{} 处理失败，{:.1}秒后进行第 {} 次重试: {}",
                    batch.seq,
                    delay.as_secs_f32(),
                    attempt,
                    e
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e.with_context(format!("批次 #{}", batch.seq))),
        }
    }
}
