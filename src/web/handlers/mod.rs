//! 代理路由处理器

pub mod health;
pub mod proxy;

pub use health::health;
pub use proxy::chat_completions;
