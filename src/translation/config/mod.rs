//! 翻译配置管理模块
//!
//! 支持环境变量、配置文件和默认值

pub mod manager;

pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const DEFAULT_BATCH_SIZE: usize = 5;
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 2;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 3;
    pub const CODE_CHAR_THRESHOLD: f32 = 0.3;

    // 语言与偏好
    pub const DEFAULT_NATIVE_LANGUAGE: &str = "en";
    pub const SELECTED_LANGUAGE_KEY: &str = "selectedLanguage";

    // 默认API设置，指向本地凭据代理
    pub const DEFAULT_API_URL: &str = "http://127.0.0.1:7080/v1/chat/completions";
    pub const DEFAULT_MODEL: &str = "gpt-4-turbo";

    // 可翻译属性
    pub const TRANSLATABLE_ATTRS: &[&str] = &["placeholder", "title", "aria-label"];

    // 排除的祖先元素
    pub const EXCLUDED_TAGS: &[&str] = &[
        "svg", "i", "code", "pre", "script", "style", "noscript", "template", "textarea", "kbd",
        "samp",
    ];

    // 排除的祖先类名
    pub const EXCLUDED_CLASSES: &[&str] = &["language-switcher"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "page-translator.toml",
        ".page-translator.toml",
        "~/.config/page-translator/config.toml",
        "/etc/page-translator/config.toml",
    ];
}
