// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    config::settings::Settings,
    domain::{
        models::{category::Category, posting::Posting},
        repositories::ledger_repository::LedgerRepository,
        search::listing_source::{FetchOutcome, ListingQuery, ListingSource},
        services::{
            category_matcher,
            dedup_ledger::{DedupVerdict, DeduplicationLedger, DurableState, FlushOutcome},
            geography_classifier,
            notifier::Notifier,
        },
    },
    infrastructure::search::posting_extractor::{Extraction, PostingExtractor},
};
use metrics::counter;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("A run is already in progress")]
    RunInProgress,
    #[error("Run task aborted: {0}")]
    Aborted(String),
}

/// 流水线运行参数
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// 每页结果数，分页偏移步长
    pub page_size: u32,
    /// 每个类别最多扫描的页数
    pub max_pages: u32,
    /// 账本读写超时
    pub ledger_timeout: Duration,
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            page_size: settings.search.page_size,
            max_pages: settings.search.max_pages,
            ledger_timeout: Duration::from_secs(settings.ledger.timeout_secs),
        }
    }
}

/// 类别分页结束的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryStop {
    /// 扫描完了配置的页数
    PageBudget,
    /// 源返回非成功状态或空页面
    EndOfResults,
    /// 页面中没有任何列表项
    NoMoreContent,
    /// 重试耗尽后的网络失败
    SourceFailure(String),
}

impl fmt::Display for CategoryStop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CategoryStop::PageBudget => f.write_str("page budget reached"),
            CategoryStop::EndOfResults => f.write_str("end of results"),
            CategoryStop::NoMoreContent => f.write_str("no more content"),
            CategoryStop::SourceFailure(reason) => write!(f, "source failure: {}", reason),
        }
    }
}

/// 单个类别在一轮中的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: String,
    pub pages: u32,
    pub extracted: usize,
    pub duplicates: usize,
    pub region_filtered: usize,
    pub keyword_filtered: usize,
    pub notified: usize,
    pub delivery_failures: usize,
    pub stop: CategoryStop,
}

impl CategoryReport {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            pages: 0,
            extracted: 0,
            duplicates: 0,
            region_filtered: 0,
            keyword_filtered: 0,
            notified: 0,
            delivery_failures: 0,
            stop: CategoryStop::PageBudget,
        }
    }
}

/// 一轮运行的汇总，`Display` 即触发接口返回的状态文本
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub durable: DurableState,
    pub categories: Vec<CategoryReport>,
    pub flush: FlushOutcome,
}

impl RunSummary {
    pub fn total_notified(&self) -> usize {
        self.categories.iter().map(|c| c.notified).sum()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == name)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Run {} finished: {} new postings notified across {} categories",
            self.run_id,
            self.total_notified(),
            self.categories.len()
        )?;
        if self.dry_run {
            f.write_str(" (dry run)")?;
        }
        writeln!(f)?;

        for report in &self.categories {
            writeln!(
                f,
                "- {}: {} notified, {} pages, {} extracted, {} duplicates, {} outside region, {} without keyword, {} delivery failures; stopped: {}",
                report.category,
                report.notified,
                report.pages,
                report.extracted,
                report.duplicates,
                report.region_filtered,
                report.keyword_filtered,
                report.delivery_failures,
                report.stop
            )?;
        }

        let durable = match &self.durable {
            DurableState::Loaded(keys) => format!("{} known postings", keys),
            DurableState::Degraded(reason) => format!("unreadable ({}), in-run dedup only", reason),
            DurableState::Disabled => "not configured".to_string(),
        };
        let flush = match &self.flush {
            FlushOutcome::Nothing => "nothing to record".to_string(),
            FlushOutcome::Written(rows) => format!("{} rows recorded", rows),
            FlushOutcome::NoStore(rows) => format!("{} rows not persisted", rows),
            FlushOutcome::Failed { rows, reason } => {
                format!("failed to record {} rows ({})", rows, reason)
            }
        };
        write!(f, "Ledger: {}; {}", durable, flush)
    }
}

/// 职位提醒流水线
///
/// 每轮按顺序处理所有类别：分页抓取 → 提取 → 去重 → 地区 → 关键词 → 通知 → 记录。
/// 账本在第一个类别之前读取一次，在最后一个类别之后批量写入一次。
/// 同一时间只允许一轮运行。
pub struct JobAlertPipeline {
    options: PipelineOptions,
    categories: Vec<Category>,
    source: Arc<dyn ListingSource>,
    extractor: PostingExtractor,
    notifier: Notifier,
    ledger_store: Option<Arc<dyn LedgerRepository>>,
    run_guard: Mutex<()>,
}

impl JobAlertPipeline {
    pub fn new(
        options: PipelineOptions,
        categories: Vec<Category>,
        source: Arc<dyn ListingSource>,
        extractor: PostingExtractor,
        notifier: Notifier,
        ledger_store: Option<Arc<dyn LedgerRepository>>,
    ) -> Self {
        Self {
            options,
            categories,
            source,
            extractor,
            notifier,
            ledger_store,
            run_guard: Mutex::new(()),
        }
    }

    /// 由配置构建流水线，类别表取自配置
    pub fn from_settings(
        settings: &Settings,
        source: Arc<dyn ListingSource>,
        extractor: PostingExtractor,
        notifier: Notifier,
        ledger_store: Option<Arc<dyn LedgerRepository>>,
    ) -> Self {
        let categories = settings.categories.iter().map(Category::from).collect();
        Self::new(
            PipelineOptions::from(settings),
            categories,
            source,
            extractor,
            notifier,
            ledger_store,
        )
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// 执行一轮
    ///
    /// 已有一轮在运行时立即返回 `RunInProgress`，不会排队。
    pub async fn run_once(&self) -> Result<RunSummary, PipelineError> {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| PipelineError::RunInProgress)?;

        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        Ok(self.execute(run_id).instrument(span).await)
    }

    /// 在独立任务中执行一轮并等待结果
    ///
    /// 调用方的 future 被丢弃（例如 HTTP 客户端断开）只会放弃等待，
    /// 运行本身会继续，直到账本写入完成。
    pub async fn trigger(self: &Arc<Self>) -> Result<RunSummary, PipelineError> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.run_once().await }.in_current_span())
            .await
            .map_err(|e| PipelineError::Aborted(e.to_string()))?
    }

    async fn execute(&self, run_id: Uuid) -> RunSummary {
        counter!("jobwatch_runs_total").increment(1);
        info!(
            categories = self.categories.len(),
            source = self.source.name(),
            transport = self.notifier.transport_name(),
            "Run started"
        );

        let store = self.ledger_store.as_deref();
        let mut ledger = DeduplicationLedger::load(store, self.options.ledger_timeout).await;

        let mut reports = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            let report = self
                .process_category(category, &mut ledger)
                .instrument(info_span!("category", category = %category.name))
                .await;
            reports.push(report);
        }

        let flush = ledger.flush(store, self.options.ledger_timeout).await;

        let summary = RunSummary {
            run_id,
            dry_run: self.notifier.is_dry_run(),
            durable: ledger.durable_state().clone(),
            categories: reports,
            flush,
        };
        info!(notified = summary.total_notified(), "Run finished");
        summary
    }

    async fn process_category(
        &self,
        category: &Category,
        ledger: &mut DeduplicationLedger,
    ) -> CategoryReport {
        let query = ListingQuery::from(category);
        let mut report = CategoryReport::new(&category.name);

        for page in 0..self.options.max_pages {
            let offset = page * self.options.page_size;
            let body = match self.source.fetch(&query, offset).await {
                FetchOutcome::Page(body) => body,
                FetchOutcome::EndOfResults => {
                    debug!(offset, "End of results");
                    report.stop = CategoryStop::EndOfResults;
                    break;
                }
                FetchOutcome::TransientFailure(reason) => {
                    warn!(offset, reason = %reason, "Giving up on remaining pages");
                    report.stop = CategoryStop::SourceFailure(reason);
                    break;
                }
            };

            report.pages += 1;
            counter!("jobwatch_pages_fetched_total", "category" => category.name.clone())
                .increment(1);

            let cards = match self.extractor.extract(&body) {
                Extraction::Postings(cards) => cards,
                Extraction::NoMoreContent => {
                    debug!(offset, "Page has no listings");
                    report.stop = CategoryStop::NoMoreContent;
                    break;
                }
            };
            report.extracted += cards.len();

            for card in cards {
                let region =
                    geography_classifier::classify(card.location.as_deref().unwrap_or_default());
                let posting = Posting::from_card(card, region, &category.name);
                self.process_posting(category, posting, ledger, &mut report)
                    .await;
            }
        }

        info!(
            pages = report.pages,
            extracted = report.extracted,
            notified = report.notified,
            stop = %report.stop,
            "Category finished"
        );
        report
    }

    async fn process_posting(
        &self,
        category: &Category,
        posting: Posting,
        ledger: &mut DeduplicationLedger,
        report: &mut CategoryReport,
    ) {
        let verdict = ledger.check(&posting, category.company_policy);
        if verdict != DedupVerdict::New {
            debug!(url = %posting.url, ?verdict, "Skipping duplicate posting");
            report.duplicates += 1;
            return;
        }

        if !posting.region.satisfies(category.target_region) {
            debug!(url = %posting.url, region = %posting.region, "Outside target region");
            report.region_filtered += 1;
            return;
        }

        if !category_matcher::matches(&posting.title, &category.keywords) {
            debug!(url = %posting.url, title = %posting.title, "No keyword match");
            report.keyword_filtered += 1;
            return;
        }

        let delivery = self.notifier.notify(category, &posting).await;
        report.delivery_failures += delivery.failed;
        if delivery.any_delivered() {
            ledger.record([&posting]);
            report.notified += 1;
        } else {
            warn!(url = %posting.url, "No recipient received the posting, not recording it");
        }
    }
}

#[cfg(test)]
#[path = "job_alert_pipeline_test.rs"]
mod tests;
