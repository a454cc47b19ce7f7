// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 规范化地区标签
///
/// 地理分类器的输出集合是封闭的。`Unknown` 仅表示地点缺失或为空，
/// 与 `Other`（有地点但不在已知表中）区分开，仅用于展示；
/// 过滤时两者都不会匹配任何具体目标地区。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Canada")]
    Canada,
    #[serde(rename = "India")]
    India,
    #[serde(rename = "United States", alias = "UnitedStates", alias = "USA")]
    UnitedStates,
    #[serde(rename = "Other")]
    Other,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Region {
    /// 展示用标签，也是写入持久化账本的值
    pub fn label(&self) -> &'static str {
        match self {
            Region::Canada => "Canada",
            Region::India => "India",
            Region::UnitedStates => "United States",
            Region::Other => "Other",
            Region::Unknown => "Unknown",
        }
    }

    /// 是否为可以作为类别目标的具体地区
    pub fn is_specific(&self) -> bool {
        !matches!(self, Region::Other | Region::Unknown)
    }

    /// 判断该地区是否满足类别的目标地区
    pub fn satisfies(&self, target: Region) -> bool {
        self.is_specific() && *self == target
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 提取器从单个列表项中解析出的职位卡片
///
/// `url` 已经过规范化（去掉查询字符串）且非空。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingCard {
    pub url: String,
    pub title: String,
    pub company: String,
    /// 地点字段在部分渲染中缺失
    pub location: Option<String>,
}

/// 职位实体
///
/// 每页重新构建，构建后不再修改；路由到通知器和账本之后丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// 规范化URL，持久去重键
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub region: Region,
    pub category: String,
}

/// 地点缺失时使用的展示值
pub const UNKNOWN_LOCATION: &str = "Unknown";

impl Posting {
    /// 由职位卡片、分类结果和所属类别构建职位
    pub fn from_card(card: PostingCard, region: Region, category: &str) -> Self {
        Self {
            url: card.url,
            title: card.title,
            company: card.company,
            location: card
                .location
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            region,
            category: category.to_string(),
        }
    }

    /// 基于内容的去重键：小写的 `标题::公司`
    ///
    /// 同一职位在同一轮中以不同URL重复渲染时，用它来抑制重复通知。
    pub fn content_key(&self) -> String {
        format!(
            "{}::{}",
            self.title.trim().to_lowercase(),
            self.company.trim().to_lowercase()
        )
    }

    /// 公司维度的去重键
    pub fn company_key(&self) -> String {
        self.company.trim().to_lowercase()
    }
}
