//! 代理服务配置
//!
//! 全部来自类型化的环境变量，上游凭据只存在于服务端进程中。

use std::fmt;
use std::time::Duration;

use crate::env::{proxy, EnvError, EnvResult, EnvVar};

#[derive(Clone)]
pub struct ProxyConfig {
    pub bind_addr: String,
    pub port: u16,
    /// 上游 chat-completions 端点
    pub upstream_url: String,
    pub upstream_api_key: String,
    /// 转发时固定使用的模型，覆盖客户端传来的值
    pub model: String,
    pub upstream_timeout: Duration,
}

impl ProxyConfig {
    /// 从环境变量创建配置；缺少上游凭据时报错
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            bind_addr: proxy::BindAddress::get()?,
            port: proxy::Port::get()?,
            upstream_url: proxy::UpstreamUrl::get()?,
            upstream_api_key: proxy::UpstreamApiKey::get()?,
            model: proxy::UpstreamModel::get()?,
            upstream_timeout: proxy::UpstreamTimeout::get()?,
        })
    }

    pub fn validate(&self) -> EnvResult<()> {
        if self.bind_addr.is_empty() {
            return Err(EnvError {
                variable: proxy::BindAddress::NAME.to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: proxy::Port::NAME.to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if url::Url::parse(&self.upstream_url).is_err() {
            return Err(EnvError {
                variable: proxy::UpstreamUrl::NAME.to_string(),
                message: format!("Invalid upstream URL '{}'", self.upstream_url),
            });
        }

        if self.upstream_api_key.trim().is_empty() {
            return Err(EnvError {
                variable: proxy::UpstreamApiKey::NAME.to_string(),
                message: "Upstream credential cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// 完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// 凭据不进入日志
impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("upstream_url", &self.upstream_url)
            .field("upstream_api_key", &"<redacted>")
            .field("model", &self.model)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}
