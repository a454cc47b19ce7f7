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

use super::helpers::{build_pipeline, card, listing, settings, start_listing_server, ListingFixture};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use jobwatch::config::settings::Settings;
use jobwatch::domain::services::notifier::TEST_SUBJECT;
use jobwatch::presentation::routes;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(settings: Settings) -> Router {
    let pipeline = Arc::new(build_pipeline(&settings));
    routes::app(pipeline, Arc::new(settings))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn idle_listing_server() -> String {
    start_listing_server(Arc::new(ListingFixture::default())).await
}

/// 健康检查测试
///
/// 验证健康检查端点是否正常工作
#[tokio::test]
async fn health_check_works() {
    let base_url = idle_listing_server().await;
    let (status, body) = get(app(settings(&base_url, None, None, None)), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn version_reports_crate_version() {
    let base_url = idle_listing_server().await;
    let (status, body) = get(app(settings(&base_url, None, None, None)), "/v1/version").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, env!("CARGO_PKG_VERSION"));
}

/// 触发端点执行一轮并返回汇总文本
#[tokio::test]
async fn trigger_runs_pipeline_and_returns_status() {
    let fixture = ListingFixture::default().page(
        "devops engineer OR sre",
        StatusCode::OK,
        listing(&[card(
            "https://x/y?z=1",
            "Senior SRE",
            "Acme",
            "Toronto, ON, Canada",
        )]),
    );
    let base_url = start_listing_server(Arc::new(fixture)).await;

    let (status, body) = get(app(settings(&base_url, None, None, None)), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("1 new postings notified across 2 categories"));
    assert!(body.contains("- DevOps: 1 notified"));
    assert!(body.contains("(dry run)"));
}

/// 运行中再次触发返回 409
#[tokio::test]
async fn concurrent_trigger_returns_conflict() {
    let slow_source = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>nothing</p>")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&slow_source)
        .await;
    let app = app(settings(&slow_source.uri(), None, None, None));

    let running = tokio::spawn(get(app.clone(), "/"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already in progress"));

    let (status, _) = running.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_email_requires_recipient() {
    let base_url = idle_listing_server().await;
    let (status, body) = get(app(settings(&base_url, None, None, None)), "/test-email").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("notifier.test_recipient is not configured"));
}

#[tokio::test]
async fn test_email_goes_through_mail_relay() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&relay)
        .await;
    let base_url = idle_listing_server().await;
    let endpoint = format!("{}/send", relay.uri());

    let (status, body) = get(
        app(settings(&base_url, None, Some(&endpoint), Some("me@example.com"))),
        "/test-email",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Test email sent to me@example.com");
    let requests = relay.received_requests().await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload["subject"], TEST_SUBJECT);
    assert_eq!(payload["to"], "me@example.com");
}

#[tokio::test]
async fn test_email_failure_is_server_error() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&relay)
        .await;
    let base_url = idle_listing_server().await;

    let (status, _) = get(
        app(settings(&base_url, None, Some(&relay.uri()), Some("me@example.com"))),
        "/test-email",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
