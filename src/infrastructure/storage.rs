// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::settings::LedgerSettings;
use crate::domain::repositories::ledger_repository::{LedgerError, LedgerRepository, LedgerRow};

/// 本地文件系统账本实现
///
/// 每张表对应 `{base_path}/{table}.jsonl`，每行是一个 JSON 字符串数组，
/// 列顺序见 [`LedgerRow::COLUMNS`]。文件只追加。
pub struct LocalLedgerStore {
    base_path: PathBuf,
    table: String,
}

impl LocalLedgerStore {
    pub fn new(base_path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            table: table.into(),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", self.table))
    }
}

#[async_trait]
impl LedgerRepository for LocalLedgerStore {
    async fn read_all_keys(&self) -> Result<Vec<String>, LedgerError> {
        let path = self.file_path();
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            // 首次运行，账本为空
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::Io(e)),
        };

        let mut keys = Vec::new();
        // 按原始字节分行，单行的非法 UTF-8 不影响其余行
        let mut segments = BufReader::new(file).split(b'\n');
        let mut line_no = 0usize;
        while let Some(segment) = segments.next_segment().await? {
            line_no += 1;
            let line = match std::str::from_utf8(&segment) {
                Ok(line) => line,
                Err(e) => {
                    warn!(path = %path.display(), line = line_no, error = %e, "Skipping ledger line with invalid UTF-8");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Vec<String>>(line) {
                Ok(columns) => {
                    if let Some(row) = LedgerRow::from_columns(columns) {
                        keys.push(row.url);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), line = line_no, error = %e, "Skipping malformed ledger line");
                }
            }
        }
        Ok(keys)
    }

    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), LedgerError> {
        if rows.is_empty() {
            return Ok(());
        }

        let path = self.file_path();
        if let Some(parent) = Path::new(&path).parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut buffer = String::new();
        for row in rows {
            buffer.push_str(&serde_json::to_string(&row.clone().into_columns())?);
            buffer.push('\n');
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    fn table(&self) -> &str {
        &self.table
    }
}

/// 内存账本实现
///
/// 用于测试和不需要跨进程持久化的部署。记录读写次数，
/// 也可以配置为始终失败以模拟存储不可达。
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    rows: Arc<RwLock<Vec<LedgerRow>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置只有 url 列的行
    pub fn with_keys(keys: &[&str]) -> Self {
        let rows = keys
            .iter()
            .filter_map(|k| LedgerRow::from_columns(vec![k.to_string()]))
            .collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
            ..Self::default()
        }
    }

    /// 所有操作都返回 `Unavailable` 的存储
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// `read_all_keys` 的调用次数
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// `append_rows` 的调用次数
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// 当前所有行的快照
    pub fn rows(&self) -> Vec<LedgerRow> {
        self.rows
            .try_read()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerStore {
    async fn read_all_keys(&self) -> Result<Vec<String>, LedgerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("in-memory store offline".to_string()));
        }
        let rows = self.rows.read().await;
        Ok(rows.iter().map(|r| r.url.clone()).collect())
    }

    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), LedgerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("in-memory store offline".to_string()));
        }
        self.rows.write().await.extend_from_slice(rows);
        Ok(())
    }

    fn table(&self) -> &str {
        "memory"
    }
}

/// 账本存储工厂函数
///
/// 未配置本地路径时返回 `None`，调用方应降级为仅本轮去重。
pub fn create_ledger_repository(
    settings: &LedgerSettings,
) -> Option<Arc<dyn LedgerRepository>> {
    let path = settings
        .local_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())?;
    Some(Arc::new(LocalLedgerStore::new(path, settings.table.clone())))
}
