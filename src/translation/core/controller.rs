//! 翻译流程控制器
//!
//! 状态机 `Idle → Scanning → Translating → Idle`。每次选择目标语言开启一次运行，
//! 运行带有递增的代号；批次结果到达时代号不符即丢弃，旧运行永远写不到新运行的节点。
//!
//! 控制器运行在单一任务上，批次请求并发地挂起在 `FuturesUnordered` 中，
//! 只有 [`PipelineController::settle_next`] 驱动它们完成并修改 DOM。

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::watch;

use super::client::{translate_with_retry, RetryPolicy, TranslationClient};
use super::prompt::BatchTranslation;
use crate::env::normalize_language_code;
use crate::parsers::html::{Layout, PageDocument};
use crate::translation::config::constants::SELECTED_LANGUAGE_KEY;
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, ErrorCategory, TranslationError, TranslationResult};
use crate::translation::pipeline::{
    create_batches, prioritize, BatchQueue, CollectorConfig, NodeTable, TextClassifier,
    TextCollector,
};
use crate::translation::processor::DomWriter;
use crate::translation::storage::PreferenceStore;

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Scanning,
    Translating,
}

/// 当前（或最近一次）运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub target_language: Option<String>,
    pub generation: u64,
    pub units_scanned: usize,
    pub batches_total: usize,
    pub batches_issued: usize,
    pub batches_succeeded: usize,
    pub batches_failed: usize,
    pub units_applied: usize,
    /// 节点已脱离文档而未写入的单元
    pub units_detached: usize,
    pub lines_discarded: usize,
    /// 本次运行期间到达的旧运行批次
    pub stale_batches_discarded: usize,
}

/// 一个批次结算的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Applied { seq: usize, units_applied: usize },
    Failed { seq: usize, category: ErrorCategory },
    Stale { generation: u64, seq: usize },
}

struct PipelineRun {
    generation: u64,
    target_language: String,
    queue: BatchQueue,
    nodes: NodeTable,
    in_flight: usize,
}

struct BatchOutcome {
    generation: u64,
    seq: usize,
    result: TranslationResult<BatchTranslation>,
}

/// 翻译流程控制器
pub struct PipelineController {
    document: PageDocument,
    client: Arc<dyn TranslationClient>,
    store: Box<dyn PreferenceStore>,
    layout: Box<dyn Layout>,
    collector: TextCollector,
    config: TranslationConfig,
    retry: RetryPolicy,
    generation: u64,
    run: Option<PipelineRun>,
    in_flight: FuturesUnordered<BoxFuture<'static, BatchOutcome>>,
    state: PipelineState,
    busy: watch::Sender<bool>,
    stats: RunStats,
}

impl PipelineController {
    pub fn new(
        document: PageDocument,
        client: Arc<dyn TranslationClient>,
        store: Box<dyn PreferenceStore>,
        layout: Box<dyn Layout>,
        config: TranslationConfig,
    ) -> Self {
        let collector = TextCollector::new(
            CollectorConfig {
                translate_attributes: config.translate_attributes,
                collect_attributes: config.translatable_attrs.clone(),
            },
            TextClassifier::new(config.classifier_config()),
        );
        let (busy, _) = watch::channel(false);

        Self {
            document,
            client,
            store,
            layout,
            collector,
            retry: RetryPolicy::from_config(&config),
            config,
            generation: 0,
            run: None,
            in_flight: FuturesUnordered::new(),
            state: PipelineState::Idle,
            busy,
            stats: RunStats::default(),
        }
    }

    pub fn document(&self) -> &PageDocument {
        &self.document
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// 忙碌指示，宿主可以绑定到加载动画
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 尚未结算的请求数，包括已被取代的运行
    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    /// 语言选择入口
    ///
    /// 原始语言恢复原文并清除偏好，其他语言记住偏好并开启新运行。
    pub fn on_language_selected(&mut self, code: &str) -> TranslationResult<()> {
        let code = normalize_language(code)?;

        if self.config.is_native_language(&code) {
            self.supersede();
            self.document.reload();
            if let Err(e) = self.store.remove(SELECTED_LANGUAGE_KEY) {
                helpers::log_error(&e, "清除语言偏好失败");
            }
            self.stats = RunStats {
                generation: self.generation,
                ..RunStats::default()
            };
            self.set_idle();
            tracing::info!("已恢复原始语言 {}", code);
            return Ok(());
        }

        if let Err(e) = self.store.set(SELECTED_LANGUAGE_KEY, &code) {
            helpers::log_error(&e, "保存语言偏好失败");
        }
        self.start_run(code);
        Ok(())
    }

    /// 页面加载时恢复上次选择的语言，返回触发的语言
    pub fn on_page_load(&mut self) -> TranslationResult<Option<String>> {
        let saved = match self.store.get(SELECTED_LANGUAGE_KEY) {
            Ok(saved) => saved,
            Err(e) => {
                helpers::log_error(&e, "读取语言偏好失败");
                None
            }
        };

        let Some(code) = saved else {
            return Ok(None);
        };

        let code = normalize_language(&code)?;
        if self.config.is_native_language(&code) {
            return Ok(None);
        }

        tracing::info!("恢复上次选择的语言 {}", code);
        self.start_run(code.clone());
        Ok(Some(code))
    }

    /// 等待下一个批次结算；没有未结算请求时返回 `None`
    pub async fn settle_next(&mut self) -> Option<Settlement> {
        let outcome = self.in_flight.next().await?;
        Some(self.settle(outcome))
    }

    /// 驱动所有请求结算，包括已被取代的运行
    pub async fn run_until_idle(&mut self) {
        while self.settle_next().await.is_some() {}
        if self.run.is_some() {
            // 队列中还有批次却没有请求在途，只会在并发上限配置为 0 时出现
            self.fill_slots();
            while self.settle_next().await.is_some() {}
        }
    }

    /// 选择语言并等待运行结束
    pub async fn translate_to(&mut self, code: &str) -> TranslationResult<RunStats> {
        self.on_language_selected(code)?;
        self.run_until_idle().await;
        Ok(self.stats.clone())
    }

    fn supersede(&mut self) {
        self.generation += 1;
        if let Some(run) = self.run.take() {
            tracing::info!(
                "运行 #{} ({}) 被取代，{} 个在途批次的结果将被丢弃",
                run.generation,
                run.target_language,
                run.in_flight
            );
        }
    }

    fn start_run(&mut self, target_language: String) {
        self.supersede();
        let generation = self.generation;

        self.state = PipelineState::Scanning;
        self.busy.send_replace(true);

        let snapshot = self.layout.measure(self.document.root());
        let scan = self.collector.scan(self.document.root(), &snapshot);
        let units_scanned = scan.units.len();
        let ordered = prioritize(scan.units);
        let batches = create_batches(ordered, self.config.batch_size);

        self.stats = RunStats {
            target_language: Some(target_language.clone()),
            generation,
            units_scanned,
            batches_total: batches.len(),
            ..RunStats::default()
        };

        tracing::info!(
            "运行 #{} 开始翻译到 {}: {} 个文本单元, {} 个批次",
            generation,
            target_language,
            units_scanned,
            batches.len()
        );

        if batches.is_empty() {
            self.set_idle();
            return;
        }

        self.run = Some(PipelineRun {
            generation,
            target_language,
            queue: BatchQueue::new(batches),
            nodes: scan.nodes,
            in_flight: 0,
        });
        self.state = PipelineState::Translating;
        self.fill_slots();
    }

    /// 在并发上限内发出排队的批次
    fn fill_slots(&mut self) {
        let limit = self.config.max_concurrent_requests.max(1);
        let Some(run) = self.run.as_mut() else {
            return;
        };

        while run.in_flight < limit {
            let Some(batch) = run.queue.dequeue() else {
                break;
            };

            tracing::debug!("发出 {}", batch.summary());
            run.in_flight += 1;
            self.stats.batches_issued += 1;

            let client = Arc::clone(&self.client);
            let policy = self.retry.clone();
            let language = run.target_language.clone();
            let generation = run.generation;

            self.in_flight.push(
                async move {
                    let result =
                        translate_with_retry(client.as_ref(), &batch, &language, &policy).await;
                    BatchOutcome {
                        generation,
                        seq: batch.seq,
                        result,
                    }
                }
                .boxed(),
            );
        }
    }

    fn settle(&mut self, outcome: BatchOutcome) -> Settlement {
        let current = self
            .run
            .as_ref()
            .map(|run| run.generation == outcome.generation)
            .unwrap_or(false);

        if !current {
            self.stats.stale_batches_discarded += 1;
            tracing::debug!(
                "丢弃已取代运行 #{} 的批次 #{}",
                outcome.generation,
                outcome.seq
            );
            return Settlement::Stale {
                generation: outcome.generation,
                seq: outcome.seq,
            };
        }

        let settlement = match outcome.result {
            Ok(translation) => self.apply(outcome.seq, &translation),
            Err(e) => {
                self.stats.batches_failed += 1;
                helpers::log_error(&e, "批次翻译失败，保留原文");
                Settlement::Failed {
                    seq: outcome.seq,
                    category: e.category(),
                }
            }
        };

        if let Some(run) = self.run.as_mut() {
            run.in_flight = run.in_flight.saturating_sub(1);
        }
        self.fill_slots();

        let finished = self
            .run
            .as_ref()
            .map(|run| run.in_flight == 0 && run.queue.is_empty())
            .unwrap_or(false);
        if finished {
            self.finish_run();
        }

        settlement
    }

    fn apply(&mut self, seq: usize, translation: &BatchTranslation) -> Settlement {
        let Some(run) = self.run.as_ref() else {
            return Settlement::Stale {
                generation: self.generation,
                seq,
            };
        };

        let report = DomWriter::new(self.document.root(), &run.nodes).apply(translation);

        self.stats.batches_succeeded += 1;
        self.stats.units_applied += report.applied;
        self.stats.units_detached += report.detached;
        self.stats.lines_discarded += translation.discarded_lines;

        tracing::debug!(
            "批次 #{} 写回 {} 个单元 (脱离 {}, 空 {}, 未知 {})",
            seq,
            report.applied,
            report.detached,
            report.empty,
            report.unknown
        );

        Settlement::Applied {
            seq,
            units_applied: report.applied,
        }
    }

    fn finish_run(&mut self) {
        if let Some(run) = self.run.take() {
            tracing::info!(
                "运行 #{} ({}) 完成: 成功 {} 批, 失败 {} 批, 写回 {} 个单元",
                run.generation,
                run.target_language,
                self.stats.batches_succeeded,
                self.stats.batches_failed,
                self.stats.units_applied
            );
        }
        self.set_idle();
    }

    fn set_idle(&mut self) {
        self.state = PipelineState::Idle;
        self.busy.send_replace(false);
    }
}

fn normalize_language(code: &str) -> TranslationResult<String> {
    normalize_language_code(code)
        .map(str::to_string)
        .ok_or_else(|| {
            TranslationError::InvalidInput(format!("无效的语言代码: {:?}", code.trim()))
        })
}
