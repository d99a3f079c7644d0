//! 文本收集器模块
//!
//! 深度优先遍历文档，收集可翻译的文本节点和属性，并记录可见性和位置信息。

use std::collections::HashMap;

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::{get_node_attr, get_text_content, is_attached, Layout, LayoutSnapshot};
use crate::translation::config::constants;
use crate::translation::pipeline::filters::{ElementInfo, RejectReason, TextClassifier};

/// 文本单元来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// 文本节点
    Text,
    /// 元素属性
    Attribute(String),
}

/// 一个可翻译的文本单元
///
/// `id` 只在产生它的那次扫描内有效。
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub id: usize,
    /// 去除首尾空白后的原文
    pub original_text: String,
    /// 最近祖先元素的小写标签名
    pub container_tag: String,
    /// 扫描时是否完全在视口内
    pub is_visible: bool,
    /// 容器顶部相对视口的偏移
    pub vertical_position: f64,
    pub kind: UnitKind,
}

impl TextUnit {
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, UnitKind::Attribute(_))
    }

    pub fn char_count(&self) -> usize {
        self.original_text.chars().count()
    }
}

/// 文本单元对应的文档位置
#[derive(Debug, Clone)]
pub enum NodeRef {
    Text(Handle),
    Attribute { element: Handle, name: String },
}

impl NodeRef {
    /// 引用的节点是否仍挂载在 `root` 下
    pub fn is_attached(&self, root: &Handle) -> bool {
        match self {
            NodeRef::Text(node) => is_attached(node, root),
            NodeRef::Attribute { element, .. } => is_attached(element, root),
        }
    }

    /// 当前文本，节点类型不符或属性已删除时返回 `None`
    pub fn current_text(&self) -> Option<String> {
        match self {
            NodeRef::Text(node) => get_text_content(node),
            NodeRef::Attribute { element, name } => get_node_attr(element, name),
        }
    }
}

/// 以单元 id 为下标的节点引用表
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    refs: Vec<NodeRef>,
}

impl NodeTable {
    fn push(&mut self, node_ref: NodeRef) -> usize {
        self.refs.push(node_ref);
        self.refs.len() - 1
    }

    pub fn get(&self, id: usize) -> Option<&NodeRef> {
        self.refs.get(id)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// 收集器配置
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 收集属性文本
    pub translate_attributes: bool,
    /// 收集的属性列表
    pub collect_attributes: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            translate_attributes: true,
            collect_attributes: constants::TRANSLATABLE_ATTRS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// 收集统计信息
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    pub nodes_visited: usize,
    /// 被整棵剪除的元素子树（排除容器或未布局）
    pub subtrees_pruned: usize,
    pub text_nodes_found: usize,
    pub attributes_found: usize,
    pub translatable_texts: usize,
    pub translatable_attributes: usize,
    pub filtered_texts: usize,
    pub filtered_attributes: usize,
    pub visible_units: usize,
    pub rejections: HashMap<RejectReason, usize>,
}

impl CollectionStats {
    pub fn total_filtered(&self) -> usize {
        self.filtered_texts + self.filtered_attributes
    }

    fn reject(&mut self, reason: RejectReason) {
        *self.rejections.entry(reason).or_insert(0) += 1;
    }
}

/// 一次扫描的结果
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// 文档顺序的文本单元
    pub units: Vec<TextUnit>,
    pub nodes: NodeTable,
    pub stats: CollectionStats,
}

impl ScanOutput {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// DOM文本收集器
pub struct TextCollector {
    config: CollectorConfig,
    classifier: TextClassifier,
}

impl TextCollector {
    pub fn new(config: CollectorConfig, classifier: TextClassifier) -> Self {
        Self { config, classifier }
    }

    /// 测量文档并扫描
    pub fn scan_with_layout(&self, root: &Handle, layout: &dyn Layout) -> ScanOutput {
        let snapshot = layout.measure(root);
        self.scan(root, &snapshot)
    }

    /// 按给定布局快照扫描 `root`
    pub fn scan(&self, root: &Handle, snapshot: &LayoutSnapshot) -> ScanOutput {
        let mut walk = Walk {
            collector: self,
            snapshot,
            infos: Vec::new(),
            containers: Vec::new(),
            output: ScanOutput::default(),
        };
        walk.visit(root);

        let output = walk.output;
        tracing::debug!(
            "扫描完成: {} 个文本单元 ({} 个可见), 过滤 {} 项, 剪除 {} 个子树",
            output.units.len(),
            output.stats.visible_units,
            output.stats.total_filtered(),
            output.stats.subtrees_pruned
        );
        output
    }
}

impl Default for TextCollector {
    fn default() -> Self {
        Self::new(CollectorConfig::default(), TextClassifier::default())
    }
}

/// 单次遍历的状态，祖先栈与容器句柄栈一一对应
struct Walk<'a> {
    collector: &'a TextCollector,
    snapshot: &'a LayoutSnapshot,
    infos: Vec<ElementInfo>,
    containers: Vec<Handle>,
    output: ScanOutput,
}

impl Walk<'_> {
    fn visit(&mut self, node: &Handle) {
        self.output.stats.nodes_visited += 1;

        match &node.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                self.collect_text(node, &text);
            }
            NodeData::Element { .. } => {
                let Some(info) = ElementInfo::from_node(node, self.snapshot) else {
                    return;
                };

                if !info.laid_out || self.collector.classifier.is_excluded_element(&info) {
                    self.output.stats.subtrees_pruned += 1;
                    return;
                }

                self.infos.push(info);
                self.containers.push(node.clone());

                if self.collector.config.translate_attributes {
                    self.collect_attributes(node);
                }

                for child in node.children.borrow().iter() {
                    self.visit(child);
                }

                self.infos.pop();
                self.containers.pop();
            }
            NodeData::Document => {
                for child in node.children.borrow().iter() {
                    self.visit(child);
                }
            }
            _ => {}
        }
    }

    fn collect_text(&mut self, node: &Handle, text: &str) {
        // 纯空白文本节点不计入统计
        if text.trim().is_empty() {
            return;
        }

        self.output.stats.text_nodes_found += 1;

        if let Some(reason) = self.collector.classifier.rejection(text, &self.infos) {
            self.output.stats.filtered_texts += 1;
            self.output.stats.reject(reason);
            return;
        }

        if self.push_unit(text, UnitKind::Text, NodeRef::Text(node.clone())) {
            self.output.stats.translatable_texts += 1;
        } else {
            self.output.stats.filtered_texts += 1;
            self.output.stats.reject(RejectReason::Hidden);
        }
    }

    fn collect_attributes(&mut self, element: &Handle) {
        let collector = self.collector;
        for attr_name in &collector.config.collect_attributes {
            let Some(value) = get_node_attr(element, attr_name) else {
                continue;
            };

            self.output.stats.attributes_found += 1;

            if let Some(reason) = collector.classifier.rejection(&value, &self.infos) {
                self.output.stats.filtered_attributes += 1;
                self.output.stats.reject(reason);
                continue;
            }

            let node_ref = NodeRef::Attribute {
                element: element.clone(),
                name: attr_name.clone(),
            };
            if self.push_unit(&value, UnitKind::Attribute(attr_name.clone()), node_ref) {
                self.output.stats.translatable_attributes += 1;
            } else {
                self.output.stats.filtered_attributes += 1;
                self.output.stats.reject(RejectReason::Hidden);
            }
        }
    }

    /// 以最近容器的几何信息登记单元，容器没有包围盒时返回 `false`
    fn push_unit(&mut self, text: &str, kind: UnitKind, node_ref: NodeRef) -> bool {
        let (Some(container), Some(info)) = (self.containers.last(), self.infos.last()) else {
            return false;
        };
        let Some(rect) = self.snapshot.rect_of(container) else {
            return false;
        };

        let is_visible = self.snapshot.is_in_viewport(&rect);
        let container_tag = info.tag.clone();
        let id = self.output.nodes.push(node_ref);

        if is_visible {
            self.output.stats.visible_units += 1;
        }

        self.output.units.push(TextUnit {
            id,
            original_text: text.trim().to_string(),
            container_tag,
            is_visible,
            vertical_position: rect.top,
            kind,
        });
        true
    }
}
