// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：职位、地区和类别
/// - 仓库接口（repositories）：通知账本的持久化抽象
/// - 搜索（search）：职位列表源接口
/// - 服务（services）：分类、匹配、去重和通知规则
pub mod models;
pub mod repositories;
pub mod search;
pub mod services;
