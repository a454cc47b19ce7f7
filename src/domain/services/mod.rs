// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 地理分类（geography_classifier）：自由文本地点到地区标签
/// - 类别匹配（category_matcher）：标题关键词子串匹配
/// - 去重账本（dedup_ledger）：本轮与跨轮的去重及批量记录
/// - 通知传输（notification_service）：单收件人投递契约
/// - 通知器（notifier）：格式化并扇出到类别收件人
pub mod category_matcher;
pub mod dedup_ledger;
pub mod geography_classifier;
pub mod notification_service;
pub mod notifier;
