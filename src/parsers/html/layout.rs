//! 文档几何信息
//!
//! 扫描器需要知道每个元素是否参与布局以及它在视口中的位置。
//! 无头环境下由 [`FlowLayout`] 估算块级流式布局；宿主若有真实布局引擎，
//! 实现 [`Layout`] 即可替换。

use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use super::dom::{get_node_attr, get_node_name};

/// 不参与渲染的元素
pub const NON_RENDERED_TAGS: &[&str] = &[
    "head", "script", "style", "template", "noscript", "title", "meta", "link", "base",
];

/// 没有文本内容时仍占据一行的替换元素
const REPLACED_TAGS: &[&str] = &["img", "input", "button", "select", "textarea", "video", "iframe"];

/// 元素的包围盒，坐标相对视口顶部
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRect {
    pub top: f64,
    pub bottom: f64,
}

impl BoundingRect {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// 一次测量得到的布局快照
///
/// 快照持有被测量元素的句柄，因此键（节点地址）在快照生命周期内不会被复用。
/// 不在快照中的元素视为未布局（隐藏）。
#[derive(Default)]
pub struct LayoutSnapshot {
    viewport_height: f64,
    rects: HashMap<usize, (Handle, BoundingRect)>,
}

impl LayoutSnapshot {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            rects: HashMap::new(),
        }
    }

    fn key(node: &Handle) -> usize {
        Rc::as_ptr(node) as usize
    }

    /// 记录元素的包围盒
    pub fn insert(&mut self, node: &Handle, rect: BoundingRect) {
        self.rects.insert(Self::key(node), (node.clone(), rect));
    }

    pub fn rect_of(&self, node: &Handle) -> Option<BoundingRect> {
        self.rects.get(&Self::key(node)).map(|(_, rect)| *rect)
    }

    pub fn is_laid_out(&self, node: &Handle) -> bool {
        self.rects.contains_key(&Self::key(node))
    }

    /// 完全落在视口内（top ≥ 0 且 bottom ≤ 视口高度）
    pub fn is_in_viewport(&self, rect: &BoundingRect) -> bool {
        rect.top >= 0.0 && rect.bottom <= self.viewport_height
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// 布局提供者
pub trait Layout {
    /// 测量文档，返回所有已布局元素的包围盒
    fn measure(&self, document: &Handle) -> LayoutSnapshot;
}

/// 视口参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub line_height: f64,
    pub char_width: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            line_height: 24.0,
            char_width: 8.0,
        }
    }
}

/// 块级流式布局估算
///
/// 每段文本按视口宽度折行，依次向下排列；元素的包围盒覆盖其内容。
#[derive(Debug, Clone, Default)]
pub struct FlowLayout {
    viewport: Viewport,
}

impl FlowLayout {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn text_height(&self, text: &str) -> f64 {
        let chars = text.split_whitespace().map(|w| w.chars().count() + 1).sum::<usize>();
        if chars == 0 {
            return 0.0;
        }
        let per_line = (self.viewport.width / self.viewport.char_width).max(1.0);
        let lines = (chars as f64 / per_line).ceil().max(1.0);
        lines * self.viewport.line_height
    }

    fn layout_node(&self, node: &Handle, y: f64, snapshot: &mut LayoutSnapshot) -> f64 {
        match &node.data {
            NodeData::Text { contents } => y + self.text_height(&contents.borrow()),
            NodeData::Element { .. } => {
                if is_hidden_element(node) {
                    return y;
                }

                let top = y;
                let mut cursor = y;
                for child in node.children.borrow().iter() {
                    cursor = self.layout_node(child, cursor, snapshot);
                }

                let tag = get_node_name(node).unwrap_or_default();
                if cursor == top && REPLACED_TAGS.contains(&tag) {
                    cursor += self.viewport.line_height;
                }

                snapshot.insert(node, BoundingRect::new(top, cursor));
                cursor
            }
            NodeData::Document => {
                let mut cursor = y;
                for child in node.children.borrow().iter() {
                    cursor = self.layout_node(child, cursor, snapshot);
                }
                snapshot.insert(node, BoundingRect::new(y, cursor));
                cursor
            }
            _ => y,
        }
    }
}

impl Layout for FlowLayout {
    fn measure(&self, document: &Handle) -> LayoutSnapshot {
        let mut snapshot = LayoutSnapshot::new(self.viewport.height);
        self.layout_node(document, 0.0, &mut snapshot);
        tracing::debug!("布局估算完成: {} 个元素", snapshot.len());
        snapshot
    }
}

/// 元素自身是否不参与布局
pub fn is_hidden_element(node: &Handle) -> bool {
    let Some(tag) = get_node_name(node) else {
        return false;
    };

    if NON_RENDERED_TAGS.contains(&tag) {
        return true;
    }

    if get_node_attr(node, "hidden").is_some() {
        return true;
    }

    if tag == "input"
        && get_node_attr(node, "type")
            .map(|t| t.eq_ignore_ascii_case("hidden"))
            .unwrap_or(false)
    {
        return true;
    }

    if let Some(style) = get_node_attr(node, "style") {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.contains("display:none") || compact.contains("visibility:hidden") {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_element_by_id, html_to_dom};

    fn small_viewport() -> Viewport {
        Viewport {
            width: 400.0,
            height: 100.0,
            line_height: 20.0,
            char_width: 10.0,
        }
    }

    #[test]
    fn test_flow_layout_stacks_paragraphs() {
        let dom = html_to_dom(
            b"<html><body><p id=\"a\">First</p><p id=\"b\">Second</p></body></html>",
            "utf-8",
        );
        let snapshot = FlowLayout::new(small_viewport()).measure(&dom.document);

        let a = snapshot.rect_of(&find_element_by_id(&dom.document, "a").unwrap()).unwrap();
        let b = snapshot.rect_of(&find_element_by_id(&dom.document, "b").unwrap()).unwrap();
        assert_eq!(a, BoundingRect::new(0.0, 20.0));
        assert_eq!(b, BoundingRect::new(20.0, 40.0));
    }

    #[test]
    fn test_flow_layout_skips_hidden_subtrees() {
        let dom = html_to_dom(
            b"<html><body><div hidden><p id=\"a\">Gone</p></div>\
              <p id=\"b\" style=\"display: none\">Also gone</p><p id=\"c\">Here</p></body></html>",
            "utf-8",
        );
        let snapshot = FlowLayout::new(small_viewport()).measure(&dom.document);

        assert!(!snapshot.is_laid_out(&find_element_by_id(&dom.document, "a").unwrap()));
        assert!(!snapshot.is_laid_out(&find_element_by_id(&dom.document, "b").unwrap()));
        let c = snapshot.rect_of(&find_element_by_id(&dom.document, "c").unwrap()).unwrap();
        assert_eq!(c.top, 0.0);
    }

    #[test]
    fn test_long_text_wraps_and_leaves_viewport() {
        let long = "word ".repeat(200);
        let html = format!(
            "<html><body><p id=\"a\">{}</p><p id=\"b\">Tail</p></body></html>",
            long
        );
        let dom = html_to_dom(html.as_bytes(), "utf-8");
        let snapshot = FlowLayout::new(small_viewport()).measure(&dom.document);

        let a = snapshot.rect_of(&find_element_by_id(&dom.document, "a").unwrap()).unwrap();
        let b = snapshot.rect_of(&find_element_by_id(&dom.document, "b").unwrap()).unwrap();
        assert!(a.height() > 20.0);
        assert!(!snapshot.is_in_viewport(&a));
        assert!(!snapshot.is_in_viewport(&b));
    }
}
