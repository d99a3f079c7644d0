//! 译文写回
//!
//! 按单元 id 把译文写回它来自的节点。写入前检查节点仍挂载在当前文档下，
//! 空译文和失效引用都保持原样。

use markup5ever_rcdom::Handle;

use crate::parsers::html::{set_node_attr, set_text_content};
use crate::translation::core::prompt::BatchTranslation;
use crate::translation::pipeline::{NodeRef, NodeTable};

/// 一次写回的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    /// 节点已脱离文档
    pub detached: usize,
    /// id 不在节点表中
    pub unknown: usize,
    pub empty: usize,
}

/// DOM 写回器
pub struct DomWriter<'a> {
    root: &'a Handle,
    nodes: &'a NodeTable,
}

impl<'a> DomWriter<'a> {
    /// `root` 必须是当前文档根
    pub fn new(root: &'a Handle, nodes: &'a NodeTable) -> Self {
        Self { root, nodes }
    }

    /// 写回一个批次的译文；重复写入同一结果得到相同文本
    pub fn apply(&self, translation: &BatchTranslation) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (&id, text) in &translation.translations {
            if text.trim().is_empty() {
                report.empty += 1;
                continue;
            }

            let Some(node_ref) = self.nodes.get(id) else {
                tracing::debug!("译文 id {} 没有对应节点", id);
                report.unknown += 1;
                continue;
            };

            if !node_ref.is_attached(self.root) {
                tracing::debug!("节点 {} 已脱离文档，跳过", id);
                report.detached += 1;
                continue;
            }

            if write_node(node_ref, text.trim()) {
                report.applied += 1;
            } else {
                report.detached += 1;
            }
        }

        report
    }
}

fn write_node(node_ref: &NodeRef, translated: &str) -> bool {
    match node_ref {
        NodeRef::Text(node) => {
            let Some(current) = node_ref.current_text() else {
                return false;
            };
            set_text_content(node, &preserve_padding(&current, translated))
        }
        NodeRef::Attribute { element, name } => {
            // 扫描后被删除的属性不再补回
            if node_ref.current_text().is_none() {
                return false;
            }
            set_node_attr(element, name, Some(translated.to_string()));
            true
        }
    }
}

/// 保留原文首尾空白，避免和相邻行内元素粘连
fn preserve_padding(current: &str, translated: &str) -> String {
    let trimmed_start = current.trim_start();
    let leading = &current[..current.len() - trimmed_start.len()];
    let trailing = &trimmed_start[trimmed_start.trim_end().len()..];

    format!("{}{}{}", leading, translated, trailing)
}
