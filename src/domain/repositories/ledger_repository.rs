// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::posting::Posting;
use async_trait::async_trait;
use thiserror::Error;

/// 账本错误类型
#[derive(Error, Debug)]
pub enum LedgerError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 存储不可用
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
    /// 超时
    #[error("Ledger operation timed out")]
    Timeout,
}

/// 持久化账本中的一行
///
/// 列顺序固定为 `[url, title, company, location, category, region]`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub category: String,
    pub region: String,
}

impl LedgerRow {
    pub const COLUMNS: [&'static str; 6] =
        ["url", "title", "company", "location", "category", "region"];

    pub fn into_columns(self) -> Vec<String> {
        vec![
            self.url,
            self.title,
            self.company,
            self.location,
            self.category,
            self.region,
        ]
    }

    /// 从列值还原一行，缺失的尾部列补为空串；首列（url）为空时返回 `None`
    pub fn from_columns(columns: Vec<String>) -> Option<Self> {
        let mut columns = columns.into_iter();
        let url = columns.next().filter(|u| !u.trim().is_empty())?;
        let mut next = || columns.next().unwrap_or_default();
        Some(Self {
            url,
            title: next(),
            company: next(),
            location: next(),
            category: next(),
            region: next(),
        })
    }
}

impl From<&Posting> for LedgerRow {
    fn from(posting: &Posting) -> Self {
        Self {
            url: posting.url.clone(),
            title: posting.title.clone(),
            company: posting.company.clone(),
            location: posting.location.clone(),
            category: posting.category.clone(),
            region: posting.region.label().to_string(),
        }
    }
}

/// 通知账本仓库特质
///
/// 按表名寻址的只追加表格存储。每轮运行最多调用一次 `read_all_keys`
/// 和一次 `append_rows`。
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// 按写入顺序读取所有已记录的键（url 列）
    async fn read_all_keys(&self) -> Result<Vec<String>, LedgerError>;

    /// 批量追加行，不会改写或删除已有行
    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), LedgerError>;

    /// 表名
    fn table(&self) -> &str;
}
