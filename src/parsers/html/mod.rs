//! HTML解析和处理模块
//!
//! - `document`: 页面文档（当前 DOM 与原始 HTML）
//! - `dom`: 基础DOM操作与节点挂载检查
//! - `layout`: 元素几何信息（视口可见性）
//! - `serializer`: 序列化功能

pub mod document;
pub mod dom;
pub mod layout;
pub mod serializer;

pub use document::PageDocument;
pub use dom::{
    collect_text, find_body, find_element_by_id, get_child_node_by_name, get_node_attr,
    get_node_name, get_parent_node, get_text_content, html_to_dom, is_attached, set_node_attr,
    set_text_content,
};
pub use layout::{BoundingRect, FlowLayout, Layout, LayoutSnapshot, Viewport};
pub use serializer::serialize_document;
