//! # Page Translator
//!
//! 按需把 HTML 页面翻译成用户选择的语言：扫描可见的可翻译文本，
//! 按视口优先级分批发送到 chat-completions 服务，再把译文原位写回 DOM。
//!
//! ## 模块组织
//!
//! - `env` - 类型化的环境变量
//! - `parsers` - HTML 解析、布局估算和序列化
//! - `translation` - 翻译管道、客户端和流程控制器
//! - `logging` - 日志初始化（二进制程序使用）
//! - `web` - 凭据代理服务（可选）

pub mod env;
#[cfg(any(feature = "cli", feature = "web"))]
pub mod logging;
pub mod parsers;
pub mod translation;
#[cfg(feature = "web")]
pub mod web;

pub use parsers::html::PageDocument;
pub use translation::{
    PipelineController, RunStats, TranslationConfig, TranslationError, TranslationResult,
};
