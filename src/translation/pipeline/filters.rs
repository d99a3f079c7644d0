//! 文本过滤器模块
//!
//! 判断一段文本及其祖先链是否可以翻译。所有判断都是纯函数，
//! 任何无法识别的输入都归为不可翻译。

use std::sync::OnceLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use crate::parsers::html::{get_node_attr, get_node_name, LayoutSnapshot};
use crate::translation::config::constants;

/// 祖先元素的分类信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementInfo {
    /// 小写标签名
    pub tag: String,
    pub classes: Vec<String>,
    /// `translate="no"` 或 `notranslate` 类
    pub translate_no: bool,
    /// 是否参与布局
    pub laid_out: bool,
}

impl ElementInfo {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            laid_out: true,
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.laid_out = false;
        self
    }

    /// 从元素节点读取分类信息，非元素返回 `None`
    pub fn from_node(node: &Handle, snapshot: &LayoutSnapshot) -> Option<Self> {
        let tag = get_node_name(node)?.to_lowercase();
        let classes: Vec<String> = get_node_attr(node, "class")
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let translate_no = get_node_attr(node, "translate")
            .map(|v| v.trim().eq_ignore_ascii_case("no"))
            .unwrap_or(false)
            || classes.iter().any(|c| c == "notranslate");

        Some(Self {
            tag,
            classes,
            translate_no,
            laid_out: snapshot.is_laid_out(node),
        })
    }
}

/// 拒绝原因，用于统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Empty,
    TooShort,
    Numeric,
    NoAlphabetic,
    CodeLike,
    Url,
    Email,
    Address,
    Hidden,
    ExcludedContainer,
}

/// 分类器配置
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// 去除首尾空白后的最小字符数
    pub min_text_length: usize,
    /// 小写标签名
    pub excluded_tags: Vec<String>,
    pub excluded_classes: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_text_length: constants::MIN_TEXT_LENGTH,
            excluded_tags: constants::EXCLUDED_TAGS.iter().map(|s| s.to_string()).collect(),
            excluded_classes: constants::EXCLUDED_CLASSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// 正则表达式缓存
#[derive(Default)]
struct RegexCache {
    numeric: OnceLock<Option<Regex>>,
    url: OnceLock<Option<Regex>>,
    email: OnceLock<Option<Regex>>,
    address_keywords: OnceLock<Option<Regex>>,
    digit_run: OnceLock<Option<Regex>>,
    road_keywords: OnceLock<Option<Regex>>,
    css_rule: OnceLock<Option<Regex>>,
}

/// 编译失败时返回 `None`，调用方按不匹配处理
fn cached<'a>(cell: &'a OnceLock<Option<Regex>>, pattern: &str) -> Option<&'a Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::error!("正则表达式编译失败 {}: {}", pattern, e);
            None
        }
    })
    .as_ref()
}

fn regex_match(cell: &OnceLock<Option<Regex>>, pattern: &str, text: &str) -> bool {
    cached(cell, pattern).map(|r| r.is_match(text)).unwrap_or(false)
}

/// 文本分类器
#[derive(Default)]
pub struct TextClassifier {
    config: ClassifierConfig,
    regex_cache: RegexCache,
}

impl TextClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            regex_cache: RegexCache::default(),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// 判断文本是否需要翻译
    ///
    /// `ancestors` 按从根到最近祖先排列，最后一个元素是文本的直接容器。
    pub fn is_translatable(&self, text: &str, ancestors: &[ElementInfo]) -> bool {
        self.rejection(text, ancestors).is_none()
    }

    /// 返回拒绝原因，可翻译时返回 `None`
    pub fn rejection(&self, text: &str, ancestors: &[ElementInfo]) -> Option<RejectReason> {
        match ancestors.last() {
            Some(container) if container.laid_out => {}
            _ => return Some(RejectReason::Hidden),
        }

        if ancestors.iter().any(|el| self.is_excluded_element(el)) {
            return Some(RejectReason::ExcludedContainer);
        }

        self.text_rejection(text)
    }

    /// 只检查文本本身
    pub fn text_rejection(&self, text: &str) -> Option<RejectReason> {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Some(RejectReason::Empty);
        }

        if trimmed.chars().count() < self.config.min_text_length {
            return Some(RejectReason::TooShort);
        }

        if regex_match(&self.regex_cache.numeric, r"^[-+.\d\s]+$", trimmed) {
            return Some(RejectReason::Numeric);
        }

        if !trimmed.chars().any(|c| c.is_alphabetic()) {
            return Some(RejectReason::NoAlphabetic);
        }

        if self.is_url(trimmed) {
            return Some(RejectReason::Url);
        }

        if self.is_email(trimmed) {
            return Some(RejectReason::Email);
        }

        if self.is_code_like(trimmed) {
            return Some(RejectReason::CodeLike);
        }

        if self.is_address(trimmed) {
            return Some(RejectReason::Address);
        }

        None
    }

    /// 元素本身是否排除其整个子树
    pub fn is_excluded_element(&self, element: &ElementInfo) -> bool {
        if element.translate_no {
            return true;
        }

        if self.config.excluded_tags.iter().any(|t| *t == element.tag) {
            return true;
        }

        element
            .classes
            .iter()
            .any(|class| self.config.excluded_classes.iter().any(|c| c == class))
    }

    /// 地址类文本：地址关键词、三位以上数字串、道路建筑关键词
    pub fn is_address(&self, text: &str) -> bool {
        let cache = &self.regex_cache;

        regex_match(
            &cache.address_keywords,
            r"(?i)\b(?:Unit|No\.|Street|Avenue|Road|Building|Estate|District|Dist\.|City|State|ZIP|Postal|Country|INDIA|USA|UK|CANADA|LLP)\b",
            text,
        ) || regex_match(&cache.digit_run, r"\b\d{3,}\b", text)
            || regex_match(
                &cache.road_keywords,
                r"(?i)\b(?:N\.H\.|(?:Highway|Boulevard|Drive|Plaza|Tower|Complex|Mall)\b)",
                text,
            )
    }

    fn is_url(&self, text: &str) -> bool {
        if text.contains(char::is_whitespace) {
            return false;
        }

        text.starts_with("www.")
            || regex_match(&self.regex_cache.url, r"^(?i)(https?|ftp)://\S+$", text)
    }

    fn is_email(&self, text: &str) -> bool {
        if text.len() > 100 || !text.contains('@') {
            return false;
        }

        regex_match(
            &self.regex_cache.email,
            r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$",
            text,
        )
    }

    /// CSS 或脚本片段
    fn is_code_like(&self, text: &str) -> bool {
        // 形如 `selector { prop: value; }` 的样式规则
        if regex_match(
            &self.regex_cache.css_rule,
            r"\{\s*-?[a-zA-Z][-a-zA-Z]*\s*:[^{}]*\}",
            text,
        ) {
            return true;
        }

        let total = text.chars().count();
        let special_chars = text
            .chars()
            .filter(|&c| {
                matches!(
                    c,
                    '{' | '}' | ';' | '[' | ']' | '(' | ')' | '=' | '<' | '>' | '/' | '\\' | '|'
                )
            })
            .count();

        special_chars as f32 > total as f32 * constants::CODE_CHAR_THRESHOLD
    }
}
