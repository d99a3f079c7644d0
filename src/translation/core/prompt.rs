//! 索引标记提示词
//!
//! 每个单元序列化为 `[id] <tag> text` 一行，响应按行首的 `[id]` 匹配回单元，
//! 与行的先后顺序无关。

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::translation::pipeline::Batch;

/// 系统指令
pub const SYSTEM_PROMPT: &str = "You are a professional website translator. \
Preserve formatting and tone, do not translate identifiers. Follow the rules strictly.";

/// 构建一个批次的用户提示词
pub fn build_prompt(batch: &Batch, target_language: &str) -> String {
    let mut prompt = format!(
        "Translate the following texts to {}.\n\
         - **DO NOT** translate phone numbers, email addresses, or locations.\n\
         - Keep spelling **100% accurate** (NO misspellings).\n\
         - Maintain natural meaning and structure.\n\
         - Preserve formatting, grammar, and professional tone.\n\
         - Reply with exactly one line per text, starting with its original [id] marker.\n\n",
        target_language
    );

    let lines: Vec<String> = batch
        .units
        .iter()
        .map(|unit| {
            format!(
                "[{}] <{}> {}",
                unit.id,
                unit.container_tag,
                collapse_whitespace(&unit.original_text)
            )
        })
        .collect();
    prompt.push_str(&lines.join("\n"));

    prompt
}

/// 多行文本压成一行，避免破坏逐行协议
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 一行解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub id: usize,
    pub text: String,
}

fn line_regex() -> Option<&'static Regex> {
    static LINE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    LINE_REGEX
        .get_or_init(|| match Regex::new(r"^\[(\d+)\]\s*(?:<[^<>]*>\s*)?(.*)$") {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::error!("响应行正则编译失败: {}", e);
                None
            }
        })
        .as_ref()
}

/// 解析一行响应
///
/// 没有可解析的 `[id]`、id 溢出或译文为空时返回 `None`。
pub fn parse_response_line(line: &str) -> Option<ParsedLine> {
    let captures = line_regex()?.captures(line.trim())?;
    let id = captures.get(1)?.as_str().parse::<usize>().ok()?;
    let text = captures.get(2)?.as_str().trim();

    if text.is_empty() {
        return None;
    }

    Some(ParsedLine {
        id,
        text: text.to_string(),
    })
}

/// 一个批次的译文，按单元 id 索引
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTranslation {
    pub translations: HashMap<usize, String>,
    /// 无法解析、id 不属于本批次或重复的行
    pub discarded_lines: usize,
}

impl BatchTranslation {
    pub fn get(&self, id: usize) -> Option<&str> {
        self.translations.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// 把模型输出匹配回批次中的单元
///
/// 同一 id 出现多次时保留第一次。
pub fn parse_response(content: &str, batch: &Batch) -> BatchTranslation {
    let mut result = BatchTranslation::default();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_response_line(line) {
            Some(parsed) if batch.contains_id(parsed.id) => {
                if result.translations.contains_key(&parsed.id) {
                    result.discarded_lines += 1;
                } else {
                    result.translations.insert(parsed.id, parsed.text);
                }
            }
            Some(parsed) => {
                tracing::debug!("丢弃不属于批次 #{} 的 id {}", batch.seq, parsed.id);
                result.discarded_lines += 1;
            }
            None => {
                tracing::debug!("丢弃无法解析的响应行: {:?}", line);
                result.discarded_lines += 1;
            }
        }
    }

    tracing::debug!(
        "批次 #{} 解析: 输入 {} 项，解析到 {} 项，丢弃 {} 行",
        batch.seq,
        batch.len(),
        result.len(),
        result.discarded_lines
    );

    result
}
