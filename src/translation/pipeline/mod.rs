//! 翻译管道模块
//!
//! 扫描、过滤、排序和分批

pub mod batch;
pub mod collector;
pub mod filters;
pub mod prioritizer;

pub use batch::{create_batches, Batch, BatchQueue};
pub use collector::{
    CollectionStats, CollectorConfig, NodeRef, NodeTable, ScanOutput, TextCollector, TextUnit,
    UnitKind,
};
pub use filters::{ClassifierConfig, ElementInfo, RejectReason, TextClassifier};
pub use prioritizer::prioritize;
