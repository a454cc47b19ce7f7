// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::posting::{Region, UNKNOWN_LOCATION};

/// 有序的地区匹配表，先匹配者优先
const REGION_TABLE: &[(&[&str], Region)] = &[
    (&["canada"], Region::Canada),
    (&["india"], Region::India),
    (&["united states", "usa"], Region::UnitedStates),
];

/// 将自由文本地点映射为规范化地区标签
///
/// 全函数：任何输入（包括空串）都只映射到一个标签，不会失败。
pub fn classify(location: &str) -> Region {
    let lowered = location.trim().to_lowercase();
    if lowered.is_empty() || lowered == UNKNOWN_LOCATION.to_lowercase() {
        return Region::Unknown;
    }

    REGION_TABLE
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| lowered.contains(p)))
        .map(|(_, region)| *region)
        .unwrap_or(Region::Other)
}
