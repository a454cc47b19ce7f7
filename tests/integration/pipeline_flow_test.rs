// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{build_pipeline, card, listing, settings, start_listing_server, ListingFixture};
use axum::http::StatusCode;
use jobwatch::application::use_cases::job_alert_pipeline::CategoryStop;
use jobwatch::domain::services::dedup_ledger::{DurableState, FlushOutcome};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVOPS: &str = "devops engineer OR sre";
const EMC: &str = "emc OR signal integrity";

fn fixture() -> ListingFixture {
    ListingFixture::default()
        .page(
            DEVOPS,
            StatusCode::OK,
            listing(&[
                card(
                    "https://ca.linkedin.com/jobs/view/senior-sre-4001?refId=abc",
                    "Senior SRE",
                    "Acme",
                    "Toronto, Ontario, Canada",
                ),
                card(
                    "https://www.linkedin.com/jobs/view/devops-4002",
                    "DevOps Engineer",
                    "Gamma",
                    "Austin, TX, United States",
                ),
                card("/jobs/view/77?trk=guest", "SRE II", "Beta", "Vancouver, BC, Canada"),
            ]),
        )
        .page(EMC, StatusCode::SERVICE_UNAVAILABLE, String::new())
}

async fn mail_relay() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// 完整流程：抓取、过滤、通知、写入账本，下一轮不再重复通知
#[tokio::test]
async fn full_run_notifies_once_across_runs() {
    let fixture = Arc::new(fixture());
    let base_url = start_listing_server(fixture.clone()).await;
    let relay = mail_relay().await;
    let ledger_dir = tempfile::tempdir().unwrap();
    let endpoint = format!("{}/send", relay.uri());
    let settings = settings(
        &base_url,
        Some(ledger_dir.path().to_str().unwrap()),
        Some(&endpoint),
        None,
    );

    let summary = build_pipeline(&settings).run_once().await.unwrap();

    let devops = summary.category("DevOps").unwrap();
    assert_eq!(devops.pages, 1);
    assert_eq!(devops.extracted, 3);
    assert_eq!(devops.notified, 2);
    assert_eq!(devops.region_filtered, 1);
    assert_eq!(devops.stop, CategoryStop::EndOfResults);

    let emc = summary.category("EMC").unwrap();
    assert!(matches!(emc.stop, CategoryStop::SourceFailure(_)));
    assert_eq!(emc.pages, 0);
    assert_eq!(summary.durable, DurableState::Loaded(0));
    assert_eq!(summary.flush, FlushOutcome::Written(2));
    assert!(!summary.dry_run);

    // 每个职位发给两个收件人
    let requests = relay.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first["from"], "alerts@jobwatch.dev");
    assert_eq!(first["to"], "ops@example.com");
    assert_eq!(first["subject"], "New DevOps job: Senior SRE");
    assert_eq!(
        first["body"],
        "Senior SRE at Acme (Toronto, Ontario, Canada)\nhttps://ca.linkedin.com/jobs/view/senior-sre-4001"
    );

    // 分页：DevOps 第二页 404；EMC 503 重试一次后放弃
    let hits = fixture.hits();
    assert!(hits.contains(&(DEVOPS.to_string(), 25)));
    assert_eq!(hits.iter().filter(|(k, _)| k == EMC).count(), 2);

    let ledger = std::fs::read_to_string(ledger_dir.path().join("notified_jobs.jsonl")).unwrap();
    let rows: Vec<Vec<String>> = ledger
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "https://ca.linkedin.com/jobs/view/senior-sre-4001");
    assert_eq!(rows[0][4], "DevOps");
    assert_eq!(rows[0][5], "Canada");
    let origin = base_url.trim_end_matches("/jobs/search");
    assert_eq!(rows[1][0], format!("{}/jobs/view/77", origin));

    // 下一轮（新进程）从账本加载，不再通知
    let summary = build_pipeline(&settings).run_once().await.unwrap();
    assert_eq!(summary.durable, DurableState::Loaded(2));
    assert_eq!(summary.total_notified(), 0);
    assert_eq!(summary.category("DevOps").unwrap().duplicates, 2);
    assert_eq!(summary.flush, FlushOutcome::Nothing);
    assert_eq!(relay.received_requests().await.unwrap().len(), 4);
}

/// 未配置传输凭据时只记录日志，但仍写入账本
#[tokio::test]
async fn dry_run_still_records_ledger() {
    let base_url = start_listing_server(Arc::new(fixture())).await;
    let ledger_dir = tempfile::tempdir().unwrap();
    let settings = settings(
        &base_url,
        Some(ledger_dir.path().to_str().unwrap()),
        None,
        None,
    );

    let summary = build_pipeline(&settings).run_once().await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.total_notified(), 2);
    assert_eq!(summary.flush, FlushOutcome::Written(2));
    assert!(summary.to_string().contains("(dry run)"));
}

/// 账本文件中的损坏行被跳过，有效的历史键仍然生效
#[tokio::test]
async fn malformed_ledger_lines_are_skipped() {
    let base_url = start_listing_server(Arc::new(fixture())).await;
    let ledger_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        ledger_dir.path().join("notified_jobs.jsonl"),
        "{broken\n[\"https://ca.linkedin.com/jobs/view/senior-sre-4001\",\"Senior SRE\"]\n",
    )
    .unwrap();
    let settings = settings(
        &base_url,
        Some(ledger_dir.path().to_str().unwrap()),
        None,
        None,
    );

    let summary = build_pipeline(&settings).run_once().await.unwrap();

    assert_eq!(summary.durable, DurableState::Loaded(1));
    assert_eq!(summary.total_notified(), 1);
    assert_eq!(summary.category("DevOps").unwrap().duplicates, 1);
}

/// 未配置账本路径时只做本轮去重
#[tokio::test]
async fn without_ledger_path_dedup_is_in_run_only() {
    let base_url = start_listing_server(Arc::new(fixture())).await;
    let settings = settings(&base_url, None, None, None);
    let pipeline = build_pipeline(&settings);

    let first = pipeline.run_once().await.unwrap();
    let second = pipeline.run_once().await.unwrap();

    assert_eq!(first.durable, DurableState::Disabled);
    assert_eq!(first.flush, FlushOutcome::NoStore(2));
    assert_eq!(second.total_notified(), 2);
}
