// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 职位（posting）：从搜索结果页中提取出的单条职位及其地区标签
/// - 类别（category）：关键词、目标地区和收件人组成的过滤配置
pub mod category;
pub mod posting;
