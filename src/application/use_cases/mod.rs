// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 每个用例代表一个完整的业务流程
pub mod job_alert_pipeline;

pub use job_alert_pipeline::{
    CategoryReport, CategoryStop, JobAlertPipeline, PipelineError, PipelineOptions, RunSummary,
};
