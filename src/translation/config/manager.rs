//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::{get_if_set, EnvVar};
use crate::parsers::html::Viewport;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::filters::ClassifierConfig;

/// 翻译配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub native_language: String,
    pub api_url: String,
    /// 直连上游时的凭据，只从本地文件或环境读取，不会写回示例配置
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,

    // 批次与并发
    pub batch_size: usize,
    pub max_concurrent_requests: usize,
    pub request_timeout_secs: u64,

    // 重试
    pub retry_enabled: bool,
    pub max_retry_attempts: usize,
    pub retry_delay_ms: u64,

    // 文本过滤
    pub min_text_length: usize,
    pub translate_attributes: bool,
    pub translatable_attrs: Vec<String>,
    pub excluded_tags: Vec<String>,
    pub excluded_classes: Vec<String>,

    // 语言偏好持久化，未设置时仅保存在内存中
    pub preferences_path: Option<String>,

    // 无头布局估算使用的视口
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub line_height: f64,
    pub char_width: f64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let viewport = Viewport::default();

        Self {
            native_language: constants::DEFAULT_NATIVE_LANGUAGE.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,
            model: constants::DEFAULT_MODEL.to_string(),

            batch_size: constants::DEFAULT_BATCH_SIZE,
            max_concurrent_requests: constants::DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            retry_enabled: true,
            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY_MS,

            min_text_length: constants::MIN_TEXT_LENGTH,
            translate_attributes: true,
            translatable_attrs: to_strings(constants::TRANSLATABLE_ATTRS),
            excluded_tags: to_strings(constants::EXCLUDED_TAGS),
            excluded_classes: to_strings(constants::EXCLUDED_CLASSES),

            preferences_path: None,

            viewport_width: viewport.width,
            viewport_height: viewport.height,
            line_height: viewport.line_height,
            char_width: viewport.char_width,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn env_override<V: EnvVar<T>, T>() -> Option<T> {
    match get_if_set::<V, T>() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("忽略无效的环境变量: {}", e);
            None
        }
    }
}

impl TranslationConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.batch_size == 0 {
            return Err(TranslationError::ConfigError("批次大小不能为0".to_string()));
        }

        if self.max_concurrent_requests == 0 {
            return Err(TranslationError::ConfigError("最大并发数不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        if self.native_language.trim().is_empty() {
            return Err(TranslationError::ConfigError("原始语言不能为空".to_string()));
        }

        if self.model.trim().is_empty() {
            return Err(TranslationError::ConfigError("模型标识不能为空".to_string()));
        }

        let url = url::Url::parse(&self.api_url)
            .map_err(|e| TranslationError::ConfigError(format!("API URL 无效: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TranslationError::ConfigError(format!(
                "API URL 必须使用 http 或 https: {}",
                self.api_url
            )));
        }

        if self.viewport_width <= 0.0
            || self.viewport_height <= 0.0
            || self.line_height <= 0.0
            || self.char_width <= 0.0
        {
            return Err(TranslationError::ConfigError("视口尺寸必须大于0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 已设置但无效的变量会被忽略并记录警告。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::translation;

        if let Some(api_url) = env_override::<translation::ApiUrl, _>() {
            tracing::info!("环境变量覆盖 API URL: {}", api_url);
            self.api_url = api_url;
        }

        if let Some(api_key) = env_override::<translation::ApiKey, _>() {
            self.api_key = Some(api_key);
        }

        if let Some(model) = env_override::<translation::Model, _>() {
            self.model = model;
        }

        if let Some(native) = env_override::<translation::NativeLang, _>() {
            self.native_language = native;
        }

        if let Some(batch_size) = env_override::<translation::BatchSize, _>() {
            self.batch_size = batch_size;
        }

        if let Some(max_concurrent) = env_override::<translation::MaxConcurrentRequests, _>() {
            self.max_concurrent_requests = max_concurrent;
        }

        if let Some(timeout) = env_override::<translation::RequestTimeout, _>() {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(path) = env_override::<translation::PreferencesPath, _>() {
            self.preferences_path = Some(path);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 有效重试次数，未启用重试时为 0
    pub fn retry_attempts(&self) -> usize {
        if self.retry_enabled {
            self.max_retry_attempts
        } else {
            0
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.viewport_width,
            height: self.viewport_height,
            line_height: self.line_height,
            char_width: self.char_width,
        }
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            min_text_length: self.min_text_length,
            excluded_tags: self.excluded_tags.iter().map(|t| t.to_lowercase()).collect(),
            excluded_classes: self.excluded_classes.clone(),
        }
    }

    /// 是否为原始语言（不区分大小写）
    pub fn is_native_language(&self, code: &str) -> bool {
        self.native_language.eq_ignore_ascii_case(code.trim())
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 按标准路径加载配置
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();
        let config = Self::search_config()?;
        Self::finish(config)
    }

    /// 从指定文件加载配置
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        tracing::info!("加载配置文件: {}", expanded);
        let config = Self::load_from_file(&expanded)?;
        Self::finish(config)
    }

    /// 直接使用给定配置（仍会校验）
    pub fn with_config(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    fn finish(mut config: TranslationConfig) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;
        Ok(Self { config })
    }

    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    fn search_config() -> TranslationResult<TranslationConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
