// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::category::Category;
use async_trait::async_trait;
use thiserror::Error;

/// 搜索源内部错误
///
/// 只在抓取器内部用于决定是否重试，不会越过 `ListingSource` 边界。
#[derive(Debug, Error)]
pub enum SourceError {
    /// 网络层错误（连接、超时、读取响应体失败）
    #[error("Network error: {0}")]
    Network(String),
    /// 可重试的HTTP状态（429、5xx）
    #[error("Retryable HTTP status {0}")]
    RetryableStatus(u16),
    /// 请求构建失败
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Network(_) | SourceError::RetryableStatus(_))
    }
}

/// 单个类别的搜索查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// 以 ` OR ` 连接的关键词
    pub keywords: String,
    /// 地点
    pub location: String,
}

impl From<&Category> for ListingQuery {
    fn from(category: &Category) -> Self {
        Self {
            keywords: category.search_keywords(),
            location: category.search_location.clone(),
        }
    }
}

/// 一次抓取的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 原始页面标记
    Page(String),
    /// 非成功状态或空响应体：停止该类别的分页
    EndOfResults,
    /// 重试耗尽后的网络层失败：放弃该类别剩余页面
    TransientFailure(String),
}

/// 职位列表源特质
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// 抓取从 `page_offset` 开始的一页结果
    async fn fetch(&self, query: &ListingQuery, page_offset: u32) -> FetchOutcome;

    /// 源名称
    fn name(&self) -> &'static str;
}
