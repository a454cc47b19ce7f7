// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::extract::Extension;
use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    application::use_cases::job_alert_pipeline::JobAlertPipeline,
    config::settings::Settings,
    presentation::errors::{AppError, RequestError},
};

/// 触发一轮运行，返回运行汇总文本
///
/// 已有一轮在运行时返回 409。客户端断开不会中断运行。
pub async fn trigger_run(
    Extension(pipeline): Extension<Arc<JobAlertPipeline>>,
) -> Result<String, AppError> {
    match pipeline.trigger().await {
        Ok(summary) => Ok(summary.to_string()),
        Err(e) => {
            warn!("Rejected run trigger: {}", e);
            Err(e.into())
        }
    }
}

/// 向配置的测试收件人发送一条测试通知
pub async fn send_test_email(
    Extension(pipeline): Extension<Arc<JobAlertPipeline>>,
    Extension(settings): Extension<Arc<Settings>>,
) -> Result<String, AppError> {
    let recipient = settings
        .notifier
        .test_recipient
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(RequestError::NotConfigured("notifier.test_recipient"))?;

    let notifier = pipeline.notifier();
    if let Err(e) = notifier.send_test(recipient).await {
        error!("Test notification to {} failed: {}", recipient, e);
        return Err(e.into());
    }

    if notifier.is_dry_run() {
        Ok(format!("Dry run: test email for {} was logged, not sent", recipient))
    } else {
        Ok(format!("Test email sent to {}", recipient))
    }
}
