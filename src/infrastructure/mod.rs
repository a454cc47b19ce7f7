// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含与外部系统交互的技术实现：
/// - 指标（metrics）：Prometheus 导出器
/// - 搜索（search）：列表页解析
/// - 服务（services）：通知传输实现
/// - 存储（storage）：通知账本存储
///
/// 基础设施层依赖于领域层的抽象接口。
pub mod metrics;
pub mod search;
pub mod services;
pub mod storage;
