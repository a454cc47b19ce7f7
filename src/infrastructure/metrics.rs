// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 安装 Prometheus 导出器
///
/// 未配置监听地址时不安装，计数器调用退化为无操作。
/// 返回是否成功安装。
pub fn init_metrics(settings: &MetricsSettings) -> bool {
    let Some(raw) = settings
        .listen_addr
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    else {
        info!("Metrics exporter disabled");
        return false;
    };

    let addr: SocketAddr = match raw.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", raw, e);
            return false;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return false;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
    true
}

fn describe_metrics() {
    describe_counter!("jobwatch_runs_total", "Total number of pipeline runs started");
    describe_counter!(
        "jobwatch_pages_fetched_total",
        "Total number of listing pages fetched, by category"
    );
    describe_counter!(
        "jobwatch_fetch_retries_total",
        "Total number of listing fetch retries"
    );
    describe_counter!(
        "jobwatch_postings_extracted_total",
        "Total number of postings extracted from listing pages"
    );
    describe_counter!(
        "jobwatch_notifications_sent_total",
        "Total number of notifications delivered, by category"
    );
    describe_counter!(
        "jobwatch_notifications_failed_total",
        "Total number of notifications that failed or timed out, by category"
    );
}
