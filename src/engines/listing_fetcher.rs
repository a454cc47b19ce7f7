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

use crate::config::settings::SearchSettings;
use crate::domain::search::listing_source::{FetchOutcome, ListingQuery, ListingSource, SourceError};
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use metrics::counter;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// 职位列表抓取器
///
/// 基于reqwest的分页查询客户端。连接池在多次请求间复用；
/// 每个请求都有超时，网络层失败按重试策略指数退避。
pub struct ListingFetcher {
    client: reqwest::Client,
    base_url: Url,
    recency: String,
    sort_by: String,
    retry_policy: RetryPolicy,
}

impl ListingFetcher {
    /// 根据搜索配置创建抓取器
    ///
    /// # 返回值
    ///
    /// * `Ok(ListingFetcher)` - 抓取器
    /// * `Err(SourceError)` - 端点无效或客户端构建失败
    pub fn new(settings: &SearchSettings) -> Result<Self, SourceError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| SourceError::InvalidRequest(format!("invalid base url: {}", e)))?;

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::InvalidRequest(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            recency: settings.recency.clone(),
            sort_by: settings.sort_by.clone(),
            retry_policy: RetryPolicy::from_settings(settings),
        })
    }

    /// 替换重试策略
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// 构建查询参数
    pub fn build_params(&self, query: &ListingQuery, page_offset: u32) -> Vec<(&'static str, String)> {
        vec![
            ("keywords", query.keywords.clone()),
            ("location", query.location.clone()),
            ("f_TPR", self.recency.clone()),
            ("sortBy", self.sort_by.clone()),
            ("start", page_offset.to_string()),
        ]
    }

    /// 构建完整的查询URL
    pub fn build_url(&self, query: &ListingQuery, page_offset: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .extend_pairs(self.build_params(query, page_offset));
        url
    }

    /// 执行一次请求
    ///
    /// * `Ok(Some(body))` - 成功页面
    /// * `Ok(None)` - 非成功状态或空响应体
    /// * `Err(SourceError)` - 网络层错误或可重试状态
    async fn fetch_once(&self, url: &Url) -> Result<Option<String>, SourceError> {
        let response = self
            .client
            .get(url.clone())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(SourceError::RetryableStatus(status.as_u16()));
        }
        if !status.is_success() {
            debug!(status = status.as_u16(), "Listing source returned non-success status");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("failed to read body: {}", e)))?;

        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(body))
    }
}

#[async_trait]
impl ListingSource for ListingFetcher {
    /// 抓取一页结果
    ///
    /// 非成功状态或空响应体视为结果结束；网络错误、429 和 5xx 按策略重试，
    /// 重试耗尽后返回 `TransientFailure`。
    async fn fetch(&self, query: &ListingQuery, page_offset: u32) -> FetchOutcome {
        let url = self.build_url(query, page_offset);
        let mut attempt = 0;

        loop {
            match self.fetch_once(&url).await {
                Ok(Some(body)) => {
                    debug!(offset = page_offset, bytes = body.len(), "Fetched listing page");
                    return FetchOutcome::Page(body);
                }
                Ok(None) => {
                    info!(offset = page_offset, "Listing source reported end of results");
                    return FetchOutcome::EndOfResults;
                }
                Err(e) if e.is_retryable() && self.retry_policy.should_retry(attempt) => {
                    attempt += 1;
                    counter!("jobwatch_fetch_retries_total").increment(1);
                    let backoff = self.retry_policy.calculate_backoff(attempt);
                    warn!(
                        offset = page_offset,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Listing fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    warn!(offset = page_offset, attempts = attempt + 1, error = %e, "Listing fetch gave up");
                    return FetchOutcome::TransientFailure(e.to_string());
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "listing_fetcher_test.rs"]
mod tests;
