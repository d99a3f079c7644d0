// 集成测试公共模块
//
// 提供 HTML 样例、按脚本应答的翻译客户端和按元素 id 指定几何信息的布局

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use markup5ever_rcdom::{Handle, NodeData};

use page_translator::parsers::html::layout::is_hidden_element;
use page_translator::parsers::html::{
    collect_text, find_element_by_id, get_node_attr, BoundingRect, Layout, LayoutSnapshot,
    PageDocument,
};
use page_translator::translation::core::prompt::{parse_response, BatchTranslation};
use page_translator::translation::storage::PreferenceStore;
use page_translator::translation::{
    Batch, PipelineController, TranslationClient, TranslationConfig, TranslationError,
    TranslationResult,
};

/// HTML 样例
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn create_simple_english_page() -> String {
        r#"<!DOCTYPE html>
<html>
<head><title>Welcome</title></head>
<body>
  <div class="language-switcher"><button>English</button><button>French</button></div>
  <h1 id="title">Welcome to our website</h1>
  <p id="intro">We build tools for curious people.</p>
  <p id="code-note">Run <code>cargo build</code> before you start.</p>
  <pre id="snippet">fn main() { println!("hello"); }</pre>
  <p id="phone">+91 22 4000 1234</p>
  <p id="address">Unit 4, Harbour Road, Mumbai</p>
  <p id="outro">Thanks for visiting us today.</p>
</body>
</html>"#
            .to_string()
    }

    /// `count` 个段落，id 为 `p0`..，文本为 `Paragraph number N here`
    pub fn create_paragraph_page(count: usize) -> String {
        let paragraphs: String = (0..count)
            .map(|i| format!("<p id=\"p{i}\">Paragraph number {} here</p>", words(i)))
            .collect();
        format!("<html><body>{}</body></html>", paragraphs)
    }

    /// 四段文本，id `a`..`d`
    pub fn create_greeting_page() -> String {
        "<html><body>\
         <p id=\"a\">Good morning</p>\
         <p id=\"b\">Good evening</p>\
         <p id=\"c\">Good night</p>\
         <p id=\"d\">See you soon</p>\
         </body></html>"
            .to_string()
    }
}

/// 数字写成英文单词，避免被当作地址过滤
pub fn words(i: usize) -> String {
    const UNITS: [&str; 10] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    ];
    i.to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| UNITS[d as usize])
        .collect::<Vec<_>>()
        .join("-")
}

pub fn text_of(document: &PageDocument, id: &str) -> String {
    find_element_by_id(document.root(), id)
        .map(|node| collect_text(&node))
        .unwrap_or_default()
}

/// 按元素 id 指定包围盒的布局
///
/// 没有指定的元素继承父元素的包围盒；`hidden` 中的 id 整棵子树不参与布局。
pub struct IdLayout {
    viewport_height: f64,
    rects: HashMap<String, BoundingRect>,
    hidden: HashSet<String>,
}

impl IdLayout {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            rects: HashMap::new(),
            hidden: HashSet::new(),
        }
    }

    pub fn with_rect(mut self, id: &str, top: f64, bottom: f64) -> Self {
        self.rects.insert(id.to_string(), BoundingRect::new(top, bottom));
        self
    }

    pub fn with_hidden(mut self, id: &str) -> Self {
        self.hidden.insert(id.to_string());
        self
    }

    fn visit(&self, node: &Handle, inherited: BoundingRect, snapshot: &mut LayoutSnapshot) {
        let rect = match &node.data {
            NodeData::Element { .. } => {
                if is_hidden_element(node) {
                    return;
                }
                let id = get_node_attr(node, "id");
                if id.as_ref().map(|id| self.hidden.contains(id)).unwrap_or(false) {
                    return;
                }
                let rect = id
                    .and_then(|id| self.rects.get(&id).copied())
                    .unwrap_or(inherited);
                snapshot.insert(node, rect);
                rect
            }
            NodeData::Document => {
                snapshot.insert(node, inherited);
                inherited
            }
            _ => return,
        };

        for child in node.children.borrow().iter() {
            self.visit(child, rect, snapshot);
        }
    }
}

impl Layout for IdLayout {
    fn measure(&self, document: &Handle) -> LayoutSnapshot {
        let mut snapshot = LayoutSnapshot::new(self.viewport_height);
        self.visit(document, BoundingRect::new(0.0, 20.0), &mut snapshot);
        snapshot
    }
}

/// 一次客户端调用的记录
#[derive(Debug, Clone)]
pub struct Call {
    pub language: String,
    pub seq: usize,
    pub ids: Vec<usize>,
}

/// 按脚本应答的翻译客户端
///
/// 默认把每个单元回显为 `[id] <tag> lang:原文`，经过真实的响应解析器。
#[derive(Default)]
pub struct ScriptedClient {
    delays: HashMap<String, Duration>,
    raw_by_id: HashMap<usize, String>,
    fail_by_id: HashMap<usize, TranslationError>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, language: &str, delay: Duration) -> Self {
        self.delays.insert(language.to_string(), delay);
        self
    }

    /// 包含 `id` 的批次返回原样的 `content`
    pub fn with_raw_reply(mut self, id: usize, content: &str) -> Self {
        self.raw_by_id.insert(id, content.to_string());
        self
    }

    /// 包含 `id` 的批次总是失败
    pub fn with_failure(mut self, id: usize, error: TranslationError) -> Self {
        self.fail_by_id.insert(id, error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn reply(&self, batch: &Batch, target_language: &str) -> TranslationResult<String> {
        for unit in &batch.units {
            if let Some(error) = self.fail_by_id.get(&unit.id) {
                return Err(error.clone());
            }
            if let Some(raw) = self.raw_by_id.get(&unit.id) {
                return Ok(raw.clone());
            }
        }

        Ok(batch
            .units
            .iter()
            .map(|unit| {
                format!(
                    "[{}] <{}> {}:{}",
                    unit.id, unit.container_tag, target_language, unit.original_text
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[async_trait]
impl TranslationClient for ScriptedClient {
    async fn translate(
        &self,
        batch: &Batch,
        target_language: &str,
    ) -> TranslationResult<BatchTranslation> {
        self.calls.lock().unwrap().push(Call {
            language: target_language.to_string(),
            seq: batch.seq,
            ids: batch.ids(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(target_language) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let content = self.reply(batch, target_language)?;
        Ok(parse_response(&content, batch))
    }
}

/// 控制器外部也能观察的偏好存储
#[derive(Clone, Default)]
pub struct SharedStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

impl PreferenceStore for SharedStore {
    fn get(&self, key: &str) -> TranslationResult<Option<String>> {
        Ok(self.value(key))
    }

    fn set(&mut self, key: &str, value: &str) -> TranslationResult<()> {
        self.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> TranslationResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// 无重试的测试配置
pub fn test_config() -> TranslationConfig {
    TranslationConfig {
        retry_enabled: false,
        request_timeout_secs: 5,
        ..TranslationConfig::default()
    }
}

pub fn build_controller(
    html: &str,
    client: Arc<ScriptedClient>,
    store: SharedStore,
    layout: impl Layout + 'static,
    config: TranslationConfig,
) -> PipelineController {
    PipelineController::new(
        PageDocument::from_html(html),
        client,
        Box::new(store),
        Box::new(layout),
        config,
    )
}
