// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::NotifierSettings;
use crate::domain::services::notification_service::NotificationService;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

/// 邮件中继请求体
#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// 邮件中继通知实现
///
/// 将每条消息以 JSON 形式 POST 到 HTTP 邮件中继，使用 Bearer 令牌认证。
/// 配置了签名密钥时附带 HMAC-SHA256 签名头。
pub struct MailRelayNotifier {
    /// HTTP 客户端
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender: String,
    /// 签名密钥
    signing_secret: Option<String>,
}

impl MailRelayNotifier {
    /// 创建新的邮件中继通知实现
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        sender: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(
                    "Failed to build mail relay client with {:?} timeout, using defaults: {}",
                    timeout, e
                );
                reqwest::Client::new()
            }
        };

        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            sender: sender.into(),
            signing_secret: None,
        }
    }

    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// 为负载生成签名，消息格式为 `{timestamp}.{payload}`
    fn generate_signature(secret: &str, payload: &str, timestamp: i64) -> Result<String> {
        let message = format!("{}.{}", timestamp, payload);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("Invalid signing key: {}", e))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl NotificationService for MailRelayNotifier {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
        let payload = MailPayload {
            from: &self.sender,
            to: recipient,
            subject,
            body,
        };
        let payload_str = serde_json::to_string(&payload)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json");

        if let Some(secret) = &self.signing_secret {
            let timestamp = chrono::Utc::now().timestamp();
            let signature = Self::generate_signature(secret, &payload_str, timestamp)?;
            request = request
                .header("X-Jobwatch-Signature", signature)
                .header("X-Jobwatch-Timestamp", timestamp.to_string());
        }

        let response = request.body(payload_str).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!(
                "Mail relay rejected message with status {}: {}",
                status,
                body
            ))
        }
    }

    fn name(&self) -> &'static str {
        "mail-relay"
    }
}

/// 只记录日志的通知实现
///
/// 未配置传输凭据时使用，每次发送都视为成功。
#[derive(Debug, Default, Clone)]
pub struct DryRunNotifier;

#[async_trait]
impl NotificationService for DryRunNotifier {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
        info!(recipient, subject, body, "Dry run: would send notification");
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

/// 通知传输工厂函数
pub fn create_notification_service(settings: &NotifierSettings) -> Arc<dyn NotificationService> {
    if !settings.has_transport() {
        warn!("Notifier credentials not configured, running in dry-run mode");
        return Arc::new(DryRunNotifier);
    }

    let endpoint = settings.endpoint.as_deref().map(str::trim).unwrap_or_default();
    let api_key = settings.api_key.as_deref().map(str::trim).unwrap_or_default();
    let mut notifier = MailRelayNotifier::new(
        endpoint,
        api_key,
        settings.sender.clone(),
        Duration::from_secs(settings.timeout_secs),
    );
    if let Some(secret) = settings
        .signing_secret
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        notifier = notifier.with_signing_secret(secret);
    }
    Arc::new(notifier)
}
