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

use crate::domain::models::posting::Region;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum SettingsError {
    /// 加载或反序列化失败
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    /// 校验失败
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// 应用程序配置设置
///
/// 进程启动时加载一次，之后以不可变值的形式传给各组件
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 搜索源配置
    pub search: SearchSettings,
    /// 通知账本配置
    pub ledger: LedgerSettings,
    /// 通知传输配置
    pub notifier: NotifierSettings,
    /// 指标导出配置
    #[serde(default)]
    pub metrics: MetricsSettings,
    /// 类别定义
    #[serde(default)]
    pub categories: Vec<CategorySettings>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 搜索源配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// 搜索端点
    pub base_url: String,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    /// 发布时间窗口过滤（如 `r3600` 表示最近一小时）
    pub recency: String,
    /// 排序方式（`DD` 按日期倒序）
    pub sort_by: String,
    /// 每页结果数，也是分页偏移的步长
    pub page_size: u32,
    /// 每个类别每轮最多扫描的页数
    pub max_pages: u32,
    /// 单次请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 网络错误的最大重试次数
    pub max_retries: u32,
    /// 初始退避时间（毫秒）
    pub initial_backoff_ms: u64,
}

/// 账本配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    /// 本地账本目录；未设置时只做本轮去重
    pub local_path: Option<String>,
    /// 表名
    pub table: String,
    /// 读写超时时间（秒）
    pub timeout_secs: u64,
}

/// 通知传输配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSettings {
    /// 邮件中继端点；未设置时以 dry-run 模式运行
    pub endpoint: Option<String>,
    /// 邮件中继 API 密钥
    pub api_key: Option<String>,
    /// 发件人地址
    pub sender: String,
    /// 请求签名密钥（可选）
    pub signing_secret: Option<String>,
    /// 单次发送超时时间（秒）
    pub timeout_secs: u64,
    /// `/test-email` 使用的收件人
    pub test_recipient: Option<String>,
}

impl NotifierSettings {
    /// 是否配置了完整的传输凭据
    pub fn has_transport(&self) -> bool {
        non_blank(&self.endpoint).is_some() && non_blank(&self.api_key).is_some()
    }
}

/// 指标导出配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Prometheus 导出地址，例如 `0.0.0.0:9000`
    pub listen_addr: Option<String>,
}

/// 类别配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySettings {
    /// 类别名称
    pub name: String,
    /// 标题关键词
    pub keywords: Vec<String>,
    /// 传给搜索源的地点，默认与目标地区相同
    pub search_location: Option<String>,
    /// 目标地区
    pub target_region: Region,
    /// 收件人
    #[serde(default)]
    pub recipients: Vec<String>,
    /// 主题模板
    pub subject: Option<String>,
    /// 同一轮内每个公司只通知一次
    #[serde(default)]
    pub suppress_duplicate_companies: bool,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加：内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`、
    /// 以 `JOBWATCH__` 为前缀的环境变量。加载后立即校验。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(SettingsError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, SettingsError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("JOBWATCH").separator("__"));

        Self::build(builder)
    }

    /// 从 TOML 文本加载配置（叠加在内置默认值之上）
    pub fn from_toml(source: &str) -> Result<Self, SettingsError> {
        let builder = Self::defaults()?.add_source(File::from_str(source, FileFormat::Toml));
        Self::build(builder)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Search source
            .set_default(
                "search.base_url",
                "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search",
            )?
            .set_default("search.user_agent", "Mozilla/5.0")?
            .set_default("search.recency", "r3600")?
            .set_default("search.sort_by", "DD")?
            .set_default("search.page_size", 25)?
            .set_default("search.max_pages", 2)?
            .set_default("search.request_timeout_secs", 20)?
            .set_default("search.max_retries", 2)?
            .set_default("search.initial_backoff_ms", 500)?
            // Ledger
            .set_default("ledger.table", "notified_jobs")?
            .set_default("ledger.timeout_secs", 15)?
            // Notifier
            .set_default("notifier.sender", "jobwatch@localhost")?
            .set_default("notifier.timeout_secs", 10)
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置，缺少必需项时在启动阶段快速失败
    pub fn validate(&self) -> Result<(), SettingsError> {
        url::Url::parse(&self.search.base_url).map_err(|e| {
            SettingsError::Invalid(format!("search.base_url is not a valid URL: {}", e))
        })?;

        if self.search.page_size == 0 {
            return Err(SettingsError::Invalid(
                "search.page_size must be greater than 0".to_string(),
            ));
        }
        if !(1..=10).contains(&self.search.max_pages) {
            return Err(SettingsError::Invalid(
                "search.max_pages must be between 1 and 10".to_string(),
            ));
        }

        match (
            non_blank(&self.notifier.endpoint),
            non_blank(&self.notifier.api_key),
        ) {
            (Some(_), None) => {
                return Err(SettingsError::Invalid(
                    "notifier.endpoint is set but notifier.api_key is missing".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(SettingsError::Invalid(
                    "notifier.api_key is set but notifier.endpoint is missing".to_string(),
                ))
            }
            _ => {}
        }
        if let Some(endpoint) = non_blank(&self.notifier.endpoint) {
            url::Url::parse(endpoint).map_err(|e| {
                SettingsError::Invalid(format!("notifier.endpoint is not a valid URL: {}", e))
            })?;
        }

        if self.categories.is_empty() {
            return Err(SettingsError::Invalid(
                "at least one category must be configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for category in &self.categories {
            let name = category.name.trim();
            if name.is_empty() {
                return Err(SettingsError::Invalid(
                    "category name cannot be empty".to_string(),
                ));
            }
            if !names.insert(name.to_lowercase()) {
                return Err(SettingsError::Invalid(format!(
                    "duplicate category name: {}",
                    name
                )));
            }
            if category.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(SettingsError::Invalid(format!(
                    "category {} requires at least one keyword",
                    name
                )));
            }
            if !category.target_region.is_specific() {
                return Err(SettingsError::Invalid(format!(
                    "category {} has no specific target region",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
