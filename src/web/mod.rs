//! 凭据代理服务
//!
//! 浏览器端或命令行的翻译客户端只和本代理通信，上游凭据留在服务端。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::ProxyConfig;
pub use routes::create_routes;
pub use types::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 代理服务器
pub struct ProxyServer {
    config: ProxyConfig,
}

impl ProxyServer {
    pub fn new(config: ProxyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// 启动代理并一直运行
    pub async fn start(&self) -> TranslationResult<()> {
        let app = create_router(&self.config)?;

        let address = self.config.listen_address();
        let listener = tokio::net::TcpListener::bind(address.as_str())
            .await
            .map_err(|e| helpers::config_error(format!("绑定 {} 失败: {}", address, e)))?;

        tracing::info!(
            "凭据代理启动于 http://{} -> {} (模型 {})",
            address,
            self.config.upstream_url,
            self.config.model
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| TranslationError::InternalError(format!("代理服务错误: {}", e)))
    }
}

/// 创建路由器
pub fn create_router(config: &ProxyConfig) -> TranslationResult<Router> {
    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .map_err(|e| helpers::config_error(format!("创建 HTTP 客户端失败: {}", e)))?;

    let state = Arc::new(AppState {
        config: config.clone(),
        http,
    });

    Ok(create_routes().with_state(state).layer(CorsLayer::permissive()))
}
