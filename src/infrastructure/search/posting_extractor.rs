// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::posting::PostingCard;
use crate::utils::url_utils::{normalize_job_url, resolve_url};
use metrics::counter;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// 提取器错误
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("Invalid selector {selector}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// 单页提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// 页面中有列表项；不完整的卡片已被丢弃，因此可能为空
    Postings(Vec<PostingCard>),
    /// 页面中没有任何列表项：该类别的分页到此为止
    NoMoreContent,
}

/// 选择器配置
///
/// 搜索源的 class 名称不稳定，这里使用 class 属性子串匹配，
/// 而非精确匹配。
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub item: String,
    pub link: String,
    pub title: String,
    pub company: String,
    pub location: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item: "li".to_string(),
            link: "[class*='_full-link']".to_string(),
            title: "[class*='_title']".to_string(),
            company: "[class*='_subtitle']".to_string(),
            location: "[class*='_location']".to_string(),
        }
    }
}

/// 职位提取器
///
/// 将一页原始标记解析为职位卡片序列。选择器的变化被限制在这里，
/// 不会影响匹配和去重逻辑。
#[derive(Debug, Clone)]
pub struct PostingExtractor {
    item: Selector,
    link: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    base_url: Option<Url>,
}

fn compile(selector: &str) -> Result<Selector, ExtractorError> {
    Selector::parse(selector).map_err(|e| ExtractorError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// 收集元素文本：逐段去除首尾空白后以单个空格连接
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl PostingExtractor {
    /// 使用默认选择器创建提取器
    pub fn new() -> Result<Self, ExtractorError> {
        Self::with_selectors(&SelectorConfig::default())
    }

    /// 使用自定义选择器创建提取器
    pub fn with_selectors(config: &SelectorConfig) -> Result<Self, ExtractorError> {
        Ok(Self {
            item: compile(&config.item)?,
            link: compile(&config.link)?,
            title: compile(&config.title)?,
            company: compile(&config.company)?,
            location: compile(&config.location)?,
            base_url: None,
        })
    }

    /// 设置用于解析相对链接的基础URL
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// 提取一页中的职位卡片
    pub fn extract(&self, raw_page: &str) -> Extraction {
        let document = Html::parse_document(raw_page);

        let mut cards = Vec::new();
        let mut nodes = 0usize;
        let mut dropped = 0usize;

        for item in document.select(&self.item) {
            nodes += 1;
            match self.parse_card(item) {
                Some(card) => cards.push(card),
                None => dropped += 1,
            }
        }

        if nodes == 0 {
            return Extraction::NoMoreContent;
        }

        counter!("jobwatch_postings_extracted_total").increment(cards.len() as u64);
        debug!(nodes, extracted = cards.len(), dropped, "Extracted listing page");
        Extraction::Postings(cards)
    }

    /// 解析单个列表项；缺少链接、标题或公司时返回 `None`
    fn parse_card(&self, item: ElementRef<'_>) -> Option<PostingCard> {
        let href = item
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))?
            .trim();
        let url = self.canonical_url(href)?;

        let title = item
            .select(&self.title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())?;
        let company = item
            .select(&self.company)
            .next()
            .map(element_text)
            .filter(|c| !c.is_empty())?;
        let location = item
            .select(&self.location)
            .next()
            .map(element_text)
            .filter(|l| !l.is_empty());

        Some(PostingCard {
            url,
            title,
            company,
            location,
        })
    }

    fn canonical_url(&self, href: &str) -> Option<String> {
        let resolved = match &self.base_url {
            Some(base) if !href.is_empty() => resolve_url(base, href).ok()?.to_string(),
            _ => href.to_string(),
        };
        let url = normalize_job_url(&resolved);
        if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        }
    }
}
