// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CategorySettings;
use crate::domain::models::posting::{Posting, Region};

/// 主题模板为空时使用的默认主题
pub const DEFAULT_SUBJECT: &str = "New job alert";

/// 同一轮内公司维度的去重策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompanyDedupPolicy {
    /// 同一公司的多个不同职位都会通知
    #[default]
    AllowRepeats,
    /// 同一轮内每个公司只通知一次
    OnePerCompany,
}

/// 类别：一组命名的过滤配置
///
/// 进程启动时加载一次，运行期间不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// 有序的小写关键词
    pub keywords: Vec<String>,
    /// 查询时传给搜索源的地点
    pub search_location: String,
    pub target_region: Region,
    pub recipients: Vec<String>,
    pub subject_template: String,
    pub company_policy: CompanyDedupPolicy,
}

impl Category {
    /// 查询关键词：以 ` OR ` 连接的析取式
    pub fn search_keywords(&self) -> String {
        self.keywords.join(" OR ")
    }

    /// 渲染邮件主题
    ///
    /// 支持 `{category}`、`{title}`、`{company}`、`{location}` 占位符。
    pub fn render_subject(&self, posting: &Posting) -> String {
        let template = self.subject_template.trim();
        if template.is_empty() {
            return DEFAULT_SUBJECT.to_string();
        }
        template
            .replace("{category}", &self.name)
            .replace("{title}", &posting.title)
            .replace("{company}", &posting.company)
            .replace("{location}", &posting.location)
    }
}

impl From<&CategorySettings> for Category {
    fn from(settings: &CategorySettings) -> Self {
        let keywords = settings
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            name: settings.name.trim().to_string(),
            keywords,
            search_location: settings
                .search_location
                .clone()
                .unwrap_or_else(|| settings.target_region.label().to_string()),
            target_region: settings.target_region,
            recipients: settings.recipients.clone(),
            subject_template: settings.subject.clone().unwrap_or_default(),
            company_policy: if settings.suppress_duplicate_companies {
                CompanyDedupPolicy::OnePerCompany
            } else {
                CompanyDedupPolicy::AllowRepeats
            },
        }
    }
}
