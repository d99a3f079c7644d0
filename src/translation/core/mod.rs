//! 翻译核心
//!
//! - `prompt`: 索引化提示词与响应解析
//! - `client`: chat-completions 客户端、超时与重试
//! - `controller`: 运行状态机，串联扫描、分批、请求与写回
//!
//! ```text
//! PipelineController (controller.rs)
//!     ├── TextCollector (pipeline/collector.rs)
//!     ├── prioritize + create_batches (pipeline/)
//!     ├── TranslationClient (client.rs)
//!     │       └── build_prompt / parse_response (prompt.rs)
//!     └── DomWriter (processor.rs)
//! ```

pub mod client;
pub mod controller;
pub mod prompt;

pub use client::{
    translate_with_retry, ChatCompletionsClient, ChatMessage, ChatRequest, RetryPolicy,
    TranslationClient,
};
pub use controller::{PipelineController, PipelineState, RunStats, Settlement};
pub use prompt::{build_prompt, parse_response, parse_response_line, BatchTranslation, ParsedLine};
