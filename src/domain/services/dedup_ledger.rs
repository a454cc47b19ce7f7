// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::category::CompanyDedupPolicy;
use crate::domain::models::posting::Posting;
use crate::domain::repositories::ledger_repository::{LedgerError, LedgerRepository, LedgerRow};
use crate::utils::url_utils::normalize_job_url;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{info, warn};

/// 持久账本在本轮中的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurableState {
    /// 已读取，包含的键数量
    Loaded(usize),
    /// 读取失败，降级为仅本轮去重
    Degraded(String),
    /// 未配置持久存储
    Disabled,
}

/// 去重判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    New,
    /// URL 已在之前的运行中通知过
    SeenInPreviousRun,
    /// 本轮已出现过相同URL
    DuplicateUrl,
    /// 本轮已出现过相同的（标题, 公司）
    DuplicateContent,
    /// 本轮已通知过同一公司（仅 `OnePerCompany` 策略）
    DuplicateCompany,
}

/// 一次批量写入的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 没有待写入的行，未访问存储
    Nothing,
    /// 成功追加的行数
    Written(usize),
    /// 未配置持久存储，丢弃的行数
    NoStore(usize),
    /// 写入失败，丢弃的行数；已发送的通知不回滚
    Failed { rows: usize, reason: String },
}

/// 去重账本
///
/// 合并两层去重：
/// - 持久层：之前运行中已通知的URL，每轮只读取一次；
/// - 本轮层：本轮见过的URL和内容键，跨类别共享，每轮重新开始。
///
/// 两层都以规范化URL为全局键，同一职位在一轮或多轮中最多通知一次，
/// 与它出现在哪个类别无关。只有公司策略按类别记录。
/// 新通知的职位在 [`flush`](Self::flush) 中一次性批量追加。
#[derive(Debug)]
pub struct DeduplicationLedger {
    durable_urls: HashSet<String>,
    durable_state: DurableState,
    run_urls: HashSet<String>,
    run_content: HashSet<String>,
    /// 类别 → 本轮已通知的公司键
    notified_companies: HashMap<String, HashSet<String>>,
    pending: Vec<LedgerRow>,
}

impl DeduplicationLedger {
    /// 仅本轮去重的账本
    pub fn in_run_only(state: DurableState) -> Self {
        Self::with_durable_keys(Vec::new(), state)
    }

    fn with_durable_keys(keys: Vec<String>, state: DurableState) -> Self {
        Self {
            durable_urls: keys
                .iter()
                .map(|k| normalize_job_url(k.trim()).to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            durable_state: state,
            run_urls: HashSet::new(),
            run_content: HashSet::new(),
            notified_companies: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// 从持久存储加载账本
    ///
    /// 只调用一次 `read_all_keys`。存储不可达或超时不会中止运行，
    /// 而是降级为仅本轮去重并记录警告。
    pub async fn load(store: Option<&dyn LedgerRepository>, timeout: Duration) -> Self {
        let Some(store) = store else {
            warn!("No durable ledger configured, deduplication is limited to the current run");
            return Self::in_run_only(DurableState::Disabled);
        };

        let result = match tokio::time::timeout(timeout, store.read_all_keys()).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout),
        };

        match result {
            Ok(keys) => {
                let mut ledger = Self::with_durable_keys(keys, DurableState::Loaded(0));
                let count = ledger.durable_urls.len();
                info!(table = store.table(), keys = count, "Durable ledger loaded");
                ledger.durable_state = DurableState::Loaded(count);
                ledger
            }
            Err(e) => {
                warn!(
                    table = store.table(),
                    error = %e,
                    "Durable ledger unreadable, degrading to in-run deduplication; previously sent postings may be re-notified"
                );
                Self::in_run_only(DurableState::Degraded(e.to_string()))
            }
        }
    }

    pub fn durable_state(&self) -> &DurableState {
        &self.durable_state
    }

    /// 检查职位是否为新职位，并把它的键标记为本轮已见
    ///
    /// 判定顺序：持久URL → 本轮URL → 本轮内容键 → 公司策略。
    pub fn check(&mut self, posting: &Posting, policy: CompanyDedupPolicy) -> DedupVerdict {
        let url_seen = !self.run_urls.insert(posting.url.clone());
        let content_seen = !self.run_content.insert(posting.content_key());

        if self.durable_urls.contains(&posting.url) {
            return DedupVerdict::SeenInPreviousRun;
        }
        if url_seen {
            return DedupVerdict::DuplicateUrl;
        }
        if content_seen {
            return DedupVerdict::DuplicateContent;
        }
        if policy == CompanyDedupPolicy::OnePerCompany
            && self
                .notified_companies
                .get(&posting.category)
                .is_some_and(|companies| companies.contains(&posting.company_key()))
        {
            return DedupVerdict::DuplicateCompany;
        }
        DedupVerdict::New
    }

    /// `check` 的布尔形式
    pub fn is_new(&mut self, posting: &Posting, policy: CompanyDedupPolicy) -> bool {
        self.check(posting, policy) == DedupVerdict::New
    }

    /// 记录已通知的职位，等待本轮结束时批量写入
    pub fn record<'a>(&mut self, postings: impl IntoIterator<Item = &'a Posting>) {
        for posting in postings {
            self.notified_companies
                .entry(posting.category.clone())
                .or_default()
                .insert(posting.company_key());
            self.pending.push(LedgerRow::from(posting));
        }
    }

    /// 待写入的行数
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// 将本轮记录的职位一次性追加到持久存储
    pub async fn flush(
        &mut self,
        store: Option<&dyn LedgerRepository>,
        timeout: Duration,
    ) -> FlushOutcome {
        if self.pending.is_empty() {
            return FlushOutcome::Nothing;
        }
        let rows = std::mem::take(&mut self.pending);

        let Some(store) = store else {
            info!(rows = rows.len(), "No durable ledger configured, notified postings are not persisted");
            return FlushOutcome::NoStore(rows.len());
        };

        let result = match tokio::time::timeout(timeout, store.append_rows(&rows)).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout),
        };

        match result {
            Ok(()) => {
                let written = rows.len();
                info!(table = store.table(), rows = written, "Durable ledger appended");
                self.durable_urls.extend(rows.into_iter().map(|row| row.url));
                FlushOutcome::Written(written)
            }
            Err(e) => {
                warn!(
                    table = store.table(),
                    rows = rows.len(),
                    error = %e,
                    "Failed to append to durable ledger, notifications already sent are kept"
                );
                FlushOutcome::Failed {
                    rows: rows.len(),
                    reason: e.to_string(),
                }
            }
        }
    }
}
