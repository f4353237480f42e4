//! HTTP metrics delivery
#![cfg(feature = "http")]

mod common;

use cfgmgmt::compliance::generate_status_reports;
use cfgmgmt::metrics::{HttpMetricsSink, report_compliance};
use cfgmgmt::store::InMemoryElementStore;
use common::{days_ago, gcp_element, metadata, status, today};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn posts_summary_and_element_documents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compliance-summary/_doc"))
        .and(body_partial_json(serde_json::json!({
            "storage": "prod",
            "compliant": 1,
            "non_compliant": 1,
            "unmanaged": 0,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/compliance/_doc"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let store = InMemoryElementStore::new()
        .with_element(gcp_element("fresh", "k1"))
        .with_element(gcp_element("stale", "k2"));
    let mut metadata = metadata();
    metadata.statuses.push(status("gcp", "fresh", days_ago(1)));
    metadata.statuses.push(status("gcp", "stale", days_ago(200)));
    let reports = generate_status_reports(&store, &metadata, "prod");

    let sink = HttpMetricsSink::new(reqwest::Client::new(), &server.uri(), "compliance").unwrap();
    let failures = report_compliance(&sink, "prod", &reports, today()).await;

    assert_eq!(failures, 0);
}

#[tokio::test]
async fn rejected_documents_are_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let store = InMemoryElementStore::new().with_element(gcp_element("svc", "k"));
    let metadata = metadata();
    let reports = generate_status_reports(&store, &metadata, "prod");

    let sink = HttpMetricsSink::new(reqwest::Client::new(), &server.uri(), "compliance").unwrap();
    assert_eq!(report_compliance(&sink, "prod", &reports, today()).await, 2);
}
