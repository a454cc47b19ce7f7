// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供通知传输的具体实现
pub mod mail_notifier_impl;

pub use mail_notifier_impl::{create_notification_service, DryRunNotifier, MailRelayNotifier};
