// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::category::Category;
use crate::domain::models::posting::Posting;
use crate::domain::services::notification_service::NotificationService;
use anyhow::anyhow;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TEST_SUBJECT: &str = "Test job alert";
pub const TEST_BODY: &str = "This is a test message from jobwatch.";

/// 单个职位的投递统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    /// 空白收件人地址，按无操作处理
    pub skipped: usize,
}

impl DeliveryReport {
    /// 至少有一个收件人投递成功
    pub fn any_delivered(&self) -> bool {
        self.delivered > 0
    }
}

/// 通知器
///
/// 按固定模板格式化职位，并逐个发送给类别配置的收件人。
/// 每个收件人的发送相互独立，一个失败不影响下一个。
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn NotificationService>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(transport: Arc<dyn NotificationService>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn is_dry_run(&self) -> bool {
        self.transport.is_dry_run()
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// 通知正文：`标题 at 公司 (地点)` 加上URL
    pub fn format_body(posting: &Posting) -> String {
        format!(
            "{} at {} ({})\n{}",
            posting.title, posting.company, posting.location, posting.url
        )
    }

    /// 向单个收件人发送固定的测试消息，用于验证传输配置
    pub async fn send_test(&self, recipient: &str) -> anyhow::Result<()> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(anyhow!("test recipient cannot be empty"));
        }

        tokio::time::timeout(
            self.timeout,
            self.transport.send(TEST_SUBJECT, TEST_BODY, recipient),
        )
        .await
        .map_err(|_| anyhow!("test notification timed out after {:?}", self.timeout))??;

        info!(recipient, transport = self.transport.name(), "Test notification sent");
        Ok(())
    }

    /// 将职位发送给类别的所有收件人
    pub async fn notify(&self, category: &Category, posting: &Posting) -> DeliveryReport {
        let subject = category.render_subject(posting);
        let body = Self::format_body(posting);
        let mut report = DeliveryReport::default();

        for recipient in &category.recipients {
            let recipient = recipient.trim();
            if recipient.is_empty() {
                report.skipped += 1;
                continue;
            }

            let result = tokio::time::timeout(
                self.timeout,
                self.transport.send(&subject, &body, recipient),
            )
            .await;

            match result {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    counter!("jobwatch_notifications_sent_total", "category" => category.name.clone())
                        .increment(1);
                    debug!(category = %category.name, recipient, "Notification delivered");
                }
                Ok(Err(e)) => {
                    report.failed += 1;
                    counter!("jobwatch_notifications_failed_total", "category" => category.name.clone())
                        .increment(1);
                    warn!(category = %category.name, recipient, error = %e, "Notification failed");
                }
                Err(_) => {
                    report.failed += 1;
                    counter!("jobwatch_notifications_failed_total", "category" => category.name.clone())
                        .increment(1);
                    warn!(category = %category.name, recipient, "Notification timed out");
                }
            }
        }

        info!(
            category = %category.name,
            title = %posting.title,
            company = %posting.company,
            region = %posting.region,
            delivered = report.delivered,
            failed = report.failed,
            "Job alert dispatched"
        );
        report
    }
}
