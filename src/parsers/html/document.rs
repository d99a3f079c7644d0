//! 页面文档
//!
//! 持有当前 DOM 和原始 HTML。恢复原文通过重新解析原始 HTML 完成，
//! 旧树上的所有节点引用随之失效。

use markup5ever_rcdom::{Handle, RcDom};

use super::dom::html_to_dom;
use super::serializer::serialize_document;

pub struct PageDocument {
    source: Vec<u8>,
    encoding: String,
    dom: RcDom,
}

impl PageDocument {
    pub fn parse(source: &[u8], encoding: &str) -> Self {
        Self {
            source: source.to_vec(),
            encoding: encoding.to_string(),
            dom: html_to_dom(source, encoding),
        }
    }

    pub fn from_html(html: &str) -> Self {
        Self::parse(html.as_bytes(), "utf-8")
    }

    /// 当前文档根
    pub fn root(&self) -> &Handle {
        &self.dom.document
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// 丢弃当前 DOM，从原始 HTML 重建
    pub fn reload(&mut self) {
        self.dom = html_to_dom(&self.source, &self.encoding);
    }

    pub fn to_html(&self) -> Vec<u8> {
        serialize_document(&self.dom.document, &self.encoding)
    }

    pub fn to_html_string(&self) -> String {
        String::from_utf8_lossy(&serialize_document(&self.dom.document, "utf-8")).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{
        collect_text, find_element_by_id, is_attached, set_text_content,
    };

    #[test]
    fn test_reload_restores_source_and_detaches_old_nodes() {
        let mut document = PageDocument::from_html("<p id=\"a\">Hello</p>");
        let p = find_element_by_id(document.root(), "a").unwrap();
        let text = p.children.borrow()[0].clone();
        set_text_content(&text, "Bonjour");
        assert_eq!(collect_text(document.root()), "Bonjour");

        document.reload();
        assert_eq!(collect_text(document.root()), "Hello");
        assert!(!is_attached(&text, document.root()));
    }
}
