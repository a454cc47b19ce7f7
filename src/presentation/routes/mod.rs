// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::job_alert_pipeline::JobAlertPipeline;
use crate::config::settings::Settings;
use crate::presentation::handlers::run_handler;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由，需要调用方提供 `Extension` 状态
pub fn routes() -> Router {
    Router::new()
        .route("/", get(run_handler::trigger_run))
        .route("/test-email", get(run_handler::send_test_email))
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
}

/// 创建带有共享状态和请求追踪的完整应用
pub fn app(pipeline: Arc<JobAlertPipeline>, settings: Arc<Settings>) -> Router {
    routes()
        .layer(Extension(pipeline))
        .layer(Extension(settings))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
