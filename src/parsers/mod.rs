//! # 解析器模块
//!
//! 页面 HTML 的解析、DOM 操作、布局估算和序列化。

pub mod html;

pub use html::{html_to_dom, serialize_document};
