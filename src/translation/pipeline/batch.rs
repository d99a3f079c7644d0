//! 翻译批次模块
//!
//! 把排好序的文本单元切成固定大小的批次，顺序跨批次保持不变。

use std::collections::VecDeque;

use super::collector::TextUnit;

/// 一个翻译请求的负载
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 批次在本次运行中的序号
    pub seq: usize,
    pub units: Vec<TextUnit>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains_id(&self, id: usize) -> bool {
        self.units.iter().any(|u| u.id == id)
    }

    pub fn ids(&self) -> Vec<usize> {
        self.units.iter().map(|u| u.id).collect()
    }

    pub fn char_count(&self) -> usize {
        self.units.iter().map(|u| u.char_count()).sum()
    }

    /// 日志用摘要
    pub fn summary(&self) -> String {
        format!(
            "批次 #{}: {} 个单元, {} 字符, ids={:?}",
            self.seq,
            self.units.len(),
            self.char_count(),
            self.ids()
        )
    }
}

/// 按 `batch_size` 切分，`batch_size` 为 0 时按 1 处理
pub fn create_batches(units: Vec<TextUnit>, batch_size: usize) -> Vec<Batch> {
    let size = batch_size.max(1);
    let mut batches = Vec::with_capacity(units.len().div_ceil(size));
    let mut current = Vec::with_capacity(size);

    for unit in units {
        current.push(unit);
        if current.len() == size {
            batches.push(Batch {
                seq: batches.len(),
                units: std::mem::replace(&mut current, Vec::with_capacity(size)),
            });
        }
    }

    if !current.is_empty() {
        batches.push(Batch {
            seq: batches.len(),
            units: current,
        });
    }

    batches
}

/// 待发送批次队列，按优先级顺序出队
#[derive(Debug, Default)]
pub struct BatchQueue {
    pending: VecDeque<Batch>,
    issued: usize,
}

impl BatchQueue {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self {
            pending: batches.into(),
            issued: 0,
        }
    }

    pub fn dequeue(&mut self) -> Option<Batch> {
        let batch = self.pending.pop_front()?;
        self.issued += 1;
        Some(batch)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
