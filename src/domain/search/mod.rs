// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 搜索领域模块
///
/// 定义职位列表源接口、查询以及抓取结果的显式状态
pub mod listing_source;
