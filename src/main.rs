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

use jobwatch::application::use_cases::job_alert_pipeline::JobAlertPipeline;
use jobwatch::config::settings::Settings;
use jobwatch::domain::services::notifier::Notifier;
use jobwatch::engines::listing_fetcher::ListingFetcher;
use jobwatch::infrastructure::search::posting_extractor::PostingExtractor;
use jobwatch::infrastructure::services::create_notification_service;
use jobwatch::infrastructure::storage::create_ledger_repository;
use jobwatch::presentation::routes;
use jobwatch::utils::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting jobwatch...");

    // 2. Load configuration, fail fast on invalid settings
    let settings = Arc::new(Settings::new()?);
    info!(
        categories = settings.categories.len(),
        "Configuration loaded"
    );

    // 3. Initialize Prometheus Metrics
    jobwatch::infrastructure::metrics::init_metrics(&settings.metrics);

    // 4. Initialize Components
    let source = Arc::new(ListingFetcher::new(&settings.search)?);
    let extractor =
        PostingExtractor::new()?.with_base_url(url::Url::parse(&settings.search.base_url)?);
    let transport = create_notification_service(&settings.notifier);
    let notifier = Notifier::new(transport, Duration::from_secs(settings.notifier.timeout_secs));
    let ledger_store = create_ledger_repository(&settings.ledger);
    if ledger_store.is_none() {
        info!("ledger.local_path not set, notified postings will only be deduplicated within a run");
    }

    let pipeline = Arc::new(JobAlertPipeline::from_settings(
        &settings,
        source,
        extractor,
        notifier,
        ledger_store,
    ));

    // 5. Start HTTP server
    let app = routes::app(pipeline, settings.clone());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
