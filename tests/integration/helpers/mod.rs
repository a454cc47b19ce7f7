// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use jobwatch::application::use_cases::job_alert_pipeline::JobAlertPipeline;
use jobwatch::config::settings::Settings;
use jobwatch::domain::services::notifier::Notifier;
use jobwatch::engines::listing_fetcher::ListingFetcher;
use jobwatch::infrastructure::search::posting_extractor::PostingExtractor;
use jobwatch::infrastructure::services::create_notification_service;
use jobwatch::infrastructure::storage::create_ledger_repository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

/// 本地职位列表服务
///
/// 按 `keywords` 参数和页码返回预置响应，未配置的页返回 404。
#[derive(Default)]
pub struct ListingFixture {
    pages: HashMap<String, Vec<(StatusCode, String)>>,
    hits: Mutex<Vec<(String, u32)>>,
}

impl ListingFixture {
    pub fn page(mut self, keywords: &str, status: StatusCode, body: String) -> Self {
        self.pages
            .entry(keywords.to_string())
            .or_default()
            .push((status, body));
        self
    }

    pub fn hits(&self) -> Vec<(String, u32)> {
        self.hits.lock().unwrap().clone()
    }
}

async fn search(
    State(fixture): State<Arc<ListingFixture>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let keywords = params.get("keywords").cloned().unwrap_or_default();
    let start: u32 = params
        .get("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    fixture.hits.lock().unwrap().push((keywords.clone(), start));

    match fixture
        .pages
        .get(&keywords)
        .and_then(|pages| pages.get((start / 25) as usize))
    {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// 启动本地列表服务，返回搜索端点URL
pub async fn start_listing_server(fixture: Arc<ListingFixture>) -> String {
    let app = Router::new()
        .route("/jobs/search", get(search))
        .with_state(fixture);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/jobs/search", addr)
}

pub fn card(url: &str, title: &str, company: &str, location: &str) -> String {
    format!(
        r#"<li><div class="base-card base-search-card">
            <a class="base-card__full-link absolute-link" href="{url}"><span class="sr-only">{title}</span></a>
            <div class="base-search-card__info">
              <h3 class="base-search-card__title">{title}</h3>
              <h4 class="base-search-card__subtitle"><a class="hidden-nested-link">{company}</a></h4>
              <div class="base-search-card__metadata">
                <span class="job-search-card__location">{location}</span>
              </div>
            </div>
        </div></li>"#
    )
}

pub fn listing(cards: &[String]) -> String {
    cards.concat()
}

/// 两个类别的测试配置：DevOps（加拿大）和 EMC（印度）
pub fn settings(
    base_url: &str,
    ledger_path: Option<&str>,
    notifier_endpoint: Option<&str>,
    test_recipient: Option<&str>,
) -> Settings {
    let mut source = format!(
        r#"
[search]
base_url = "{base_url}"
user_agent = "jobwatch-test"
max_pages = 2
request_timeout_secs = 5
max_retries = 1
initial_backoff_ms = 1

[ledger]
table = "notified_jobs"
timeout_secs = 5

[notifier]
sender = "alerts@jobwatch.dev"
timeout_secs = 5
"#
    );
    if let Some(path) = ledger_path {
        source = source.replace(
            "[ledger]\n",
            &format!("[ledger]\nlocal_path = \"{}\"\n", path.replace('\\', "/")),
        );
    }
    if let Some(endpoint) = notifier_endpoint {
        source = source.replace(
            "[notifier]\n",
            &format!("[notifier]\nendpoint = \"{}\"\napi_key = \"test-key\"\n", endpoint),
        );
    }
    if let Some(recipient) = test_recipient {
        source = source.replace(
            "[notifier]\n",
            &format!("[notifier]\ntest_recipient = \"{}\"\n", recipient),
        );
    }
    source.push_str(
        r#"
[[categories]]
name = "DevOps"
keywords = ["devops engineer", "sre"]
target_region = "Canada"
subject = "New {category} job: {title}"
recipients = ["ops@example.com", "lead@example.com"]

[[categories]]
name = "EMC"
keywords = ["emc", "signal integrity"]
target_region = "India"
recipients = ["emc@example.com"]
"#,
    );
    Settings::from_toml(&source).unwrap()
}

/// 按进程入口相同的方式组装流水线
pub fn build_pipeline(settings: &Settings) -> JobAlertPipeline {
    let source = Arc::new(ListingFetcher::new(&settings.search).unwrap());
    let extractor = PostingExtractor::new()
        .unwrap()
        .with_base_url(Url::parse(&settings.search.base_url).unwrap());
    let notifier = Notifier::new(
        create_notification_service(&settings.notifier),
        Duration::from_secs(settings.notifier.timeout_secs),
    );
    JobAlertPipeline::from_settings(
        settings,
        source,
        extractor,
        notifier,
        create_ledger_repository(&settings.ledger),
    )
}
