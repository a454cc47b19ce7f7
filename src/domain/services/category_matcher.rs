// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 判断职位标题是否属于类别
///
/// 小写标题包含至少一个关键词子串即为匹配。空关键词会被忽略，
/// 否则它会匹配任何标题。
pub fn matches(title: &str, keywords: &[String]) -> bool {
    let lowered = title.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| lowered.contains(k.as_str()))
}
