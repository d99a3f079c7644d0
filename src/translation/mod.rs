//! 翻译模块
//!
//! - **config**: 配置管理
//! - **core**: 提示词协议、翻译客户端和流程控制器
//! - **error**: 错误处理
//! - **pipeline**: 文本处理管道（收集、过滤、排序、分批）
//! - **processor**: 译文写回
//! - **storage**: 语言偏好存储
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use page_translator::parsers::html::{FlowLayout, PageDocument};
//! use page_translator::translation::{
//!     ChatCompletionsClient, MemoryPreferenceStore, PipelineController, TranslationConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslationConfig::default();
//! let client = ChatCompletionsClient::from_config(&config)?;
//! let mut controller = PipelineController::new(
//!     PageDocument::from_html("<p>Hello world</p>"),
//!     Arc::new(client),
//!     Box::new(MemoryPreferenceStore::new()),
//!     Box::new(FlowLayout::new(config.viewport())),
//!     config,
//! );
//!
//! let stats = controller.translate_to("fr").await?;
//! println!("写回 {} 个单元", stats.units_applied);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod storage;

pub use config::{constants, ConfigManager, TranslationConfig};
pub use core::{
    ChatCompletionsClient, PipelineController, PipelineState, RetryPolicy, RunStats, Settlement,
    TranslationClient,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::{Batch, TextClassifier, TextCollector, TextUnit};
pub use processor::{ApplyReport, DomWriter};
pub use storage::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};

/// 判断文本本身是否值得翻译（不考虑所在元素）
///
/// ```rust
/// use page_translator::translation::should_translate;
///
/// assert!(should_translate("Hello World"));
/// assert!(!should_translate("123"));
/// assert!(!should_translate("   "));
/// ```
pub fn should_translate(text: &str) -> bool {
    TextClassifier::default().text_rejection(text).is_none()
}
