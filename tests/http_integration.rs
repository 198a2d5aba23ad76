//! HTTP integration tests
//!
//! Uses wiremock for the PageSpeed endpoint, the OAuth token endpoint and
//! the Sheets API. Covers request shape, status and timeout mapping, token
//! caching, and the full fetch → extract → append chain over HTTP.

use std::sync::Arc;
use std::time::Duration;

use pagespeed_monitor::runner::run_unit;
use pagespeed_monitor::{
    AuditClient, MonitorError, PageSpeedClient, PageSpeedConfig, ResultSink, ServiceAccountKey,
    ServiceAccountTokenProvider, SheetsConfig, SheetsSink, StaticTokenProvider, Strategy,
    TokenProvider, UnitOutcome,
};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_ACCOUNT: &str = include_str!("fixtures/service-account.json");
const APPEND_PATH: &str = "/v4/spreadsheets/sheet-123/values/Sheet1!A:H:append";

fn pagespeed_client(server: &MockServer, api_key: &str, timeout: Duration) -> PageSpeedClient {
    PageSpeedClient::new(PageSpeedConfig {
        endpoint: format!("{}/pagespeedonline/v5/runPagespeed", server.uri()),
        api_key: api_key.to_string(),
        timeout,
    })
    .expect("failed to create client")
}

fn sheets_sink(server: &MockServer, tokens: Arc<dyn TokenProvider>) -> SheetsSink {
    let config = SheetsConfig {
        base_url: server.uri(),
        ..SheetsConfig::new("sheet-123")
    };
    SheetsSink::new(config, tokens).expect("failed to create sink")
}

fn lighthouse_body() -> serde_json::Value {
    serde_json::json!({
        "lighthouseResult": {
            "audits": {
                "cumulative-layout-shift": {"numericValue": 0.1234},
                "total-blocking-time": {"numericValue": 150.0},
                "speed-index": {"numericValue": 2875.456},
                "largest-contentful-paint": {"numericValue": 2410.2},
                "first-contentful-paint": {"numericValue": 1203.987}
            }
        }
    })
}

// ─── PageSpeed Client ────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_sends_audit_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pagespeedonline/v5/runPagespeed"))
        .and(query_param("url", "https://example.com"))
        .and(query_param("strategy", "mobile"))
        .and(query_param("category", "performance"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lighthouse_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = pagespeed_client(&server, "test-key", Duration::from_secs(5));
    let result = client
        .fetch("https://example.com", Strategy::Mobile)
        .await
        .expect("fetch failed");

    let audits = result.audits().expect("audits present");
    assert_eq!(audits.len(), 5);
}

#[tokio::test]
async fn test_fetch_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pagespeedonline/v5/runPagespeed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Lighthouse returned error"))
        .mount(&server)
        .await;

    let client = pagespeed_client(&server, "", Duration::from_secs(5));
    let err = client
        .fetch("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    match err {
        MonitorError::Status {
            service,
            status,
            body,
        } => {
            assert_eq!(service, "PageSpeed");
            assert_eq!(status, 500);
            assert!(body.contains("Lighthouse returned error"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(lighthouse_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = pagespeed_client(&server, "", Duration::from_millis(200));
    let err = client
        .fetch("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    assert!(matches!(err, MonitorError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = pagespeed_client(&server, "", Duration::from_secs(5));
    let err = client
        .fetch("https://example.com", Strategy::Mobile)
        .await
        .unwrap_err();

    assert!(matches!(err, MonitorError::Decode(_)), "got {:?}", err);
}

// ─── Sheets Sink ─────────────────────────────────────────────────

#[tokio::test]
async fn test_append_posts_raw_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(APPEND_PATH))
        .and(header("authorization", "Bearer static-token"))
        .and(query_param("valueInputOption", "RAW"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(body_json(serde_json::json!({
            "values": [[
                "https://example.com",
                "2024-03-01 12:30:05",
                0.123, 150.0, 2875.46, 2410.2, 1203.99,
                "Mobile"
            ]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "spreadsheetId": "sheet-123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = pagespeed_monitor::AuditResult::new(lighthouse_body());
    let captured_at = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 30, 5)
        .unwrap();
    let record = pagespeed_monitor::extract::extract_at(
        Some(&result),
        "https://example.com",
        Strategy::Mobile,
        captured_at,
    )
    .unwrap();

    let sink = sheets_sink(&server, Arc::new(StaticTokenProvider::new("static-token")));
    sink.append(&record).await.expect("append failed");
}

#[tokio::test]
async fn test_append_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(APPEND_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let result = pagespeed_monitor::AuditResult::new(lighthouse_body());
    let record =
        pagespeed_monitor::extract(Some(&result), "https://example.com", Strategy::Desktop)
            .unwrap();

    let sink = sheets_sink(&server, Arc::new(StaticTokenProvider::new("t")));
    let err = sink.append(&record).await.unwrap_err();

    assert!(
        matches!(err, MonitorError::Status { status: 403, .. }),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_append_error_body_is_capped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(APPEND_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(5000)))
        .mount(&server)
        .await;

    let result = pagespeed_monitor::AuditResult::new(lighthouse_body());
    let record =
        pagespeed_monitor::extract(Some(&result), "https://example.com", Strategy::Mobile)
            .unwrap();

    let sink = sheets_sink(&server, Arc::new(StaticTokenProvider::new("t")));
    match sink.append(&record).await.unwrap_err() {
        MonitorError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body.chars().count(), 512);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_append_to_range_with_reserved_characters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values/Q1%20%232%3F!A:H:append"))
        .and(query_param("valueInputOption", "RAW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = SheetsConfig {
        base_url: server.uri(),
        range: "Q1 #2?!A:H".to_string(),
        ..SheetsConfig::new("sheet-123")
    };
    let sink = SheetsSink::new(config, Arc::new(StaticTokenProvider::new("t"))).unwrap();

    let result = pagespeed_monitor::AuditResult::new(lighthouse_body());
    let record =
        pagespeed_monitor::extract(Some(&result), "https://example.com", Strategy::Desktop)
            .unwrap();
    sink.append(&record).await.expect("append failed");
}

// ─── Service Account Tokens ──────────────────────────────────────

fn service_account(server: &MockServer) -> ServiceAccountTokenProvider {
    let mut key = ServiceAccountKey::from_json(SERVICE_ACCOUNT).unwrap();
    key.token_uri = format!("{}/token", server.uri());
    ServiceAccountTokenProvider::new(
        key,
        vec!["https://www.googleapis.com/auth/spreadsheets".to_string()],
    )
    .unwrap()
}

#[tokio::test]
async fn test_token_exchange_is_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.minted",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(APPEND_PATH))
        .and(header("authorization", "Bearer ya29.minted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(3)
        .mount(&server)
        .await;

    let sink = sheets_sink(&server, Arc::new(service_account(&server)));
    let result = pagespeed_monitor::AuditResult::new(lighthouse_body());
    for strategy in [Strategy::Mobile, Strategy::Desktop, Strategy::Mobile] {
        let record = pagespeed_monitor::extract(Some(&result), "https://example.com", strategy)
            .unwrap();
        sink.append(&record).await.expect("append failed");
    }
}

#[tokio::test]
async fn test_token_endpoint_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let provider = service_account(&server);
    let err = provider.token().await.unwrap_err();

    match err {
        MonitorError::Auth(reason) => assert!(reason.contains("invalid_grant")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_token_error_body_is_capped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("y".repeat(5000)))
        .mount(&server)
        .await;

    let err = service_account(&server).token().await.unwrap_err();

    match err {
        MonitorError::Auth(reason) => {
            assert!(reason.starts_with("Token endpoint returned 503"));
            let body = reason.rsplit(": ").next().unwrap();
            assert_eq!(body.len(), 512);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

// ─── Full Chain ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unit_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pagespeedonline/v5/runPagespeed"))
        .and(query_param("strategy", "desktop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lighthouse_body()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(APPEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = pagespeed_client(&server, "k", Duration::from_secs(5));
    let sink = sheets_sink(&server, Arc::new(StaticTokenProvider::new("t")));

    let outcome = run_unit(&client, &sink, "https://example.com", Strategy::Desktop).await;
    match outcome {
        UnitOutcome::Completed(record) => {
            assert_eq!(record.cls, 0.123);
            assert_eq!(record.fcp, 1203.99);
            assert_eq!(record.strategy, Strategy::Desktop);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}
