// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;

/// 通知传输特质
///
/// 定义向单个收件人投递消息的最小契约
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 发送一条消息
    ///
    /// # 参数
    ///
    /// * `subject` - 主题
    /// * `body` - 正文
    /// * `recipient` - 收件人地址
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 发送成功
    /// * `Err(anyhow::Error)` - 发送失败
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()>;

    /// 是否为只记录日志、不产生副作用的传输
    fn is_dry_run(&self) -> bool {
        false
    }

    /// 传输名称
    fn name(&self) -> &'static str;
}
