//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use crate::types::BackoffType;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(base_url: &str) -> HttpClientConfigBuilder {
    HttpClientConfig::builder()
        .base_url(base_url)
        .no_rate_limit()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
}

fn no_query() -> crate::types::QueryParams {
    Vec::new()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 5);
    assert!(config.rate_limit.is_some());
    assert!(config.quota_limit.is_none());
    assert!(config.user_agent.starts_with("tap-onfleet/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com/v2")
        .timeout(Duration::from_secs(60))
        .max_retries(7)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .quota(25.0, Duration::from_secs(3))
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, "https://api.example.com/v2");
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 7);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(config.quota_limit, Some(25.0));
    assert_eq!(config.quota_pause, Duration::from_secs(3));
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_calculate_backoff() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_secs(1),
        )
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(800));
    assert_eq!(client.calculate_backoff(4), Duration::from_secs(1));
    assert_eq!(client.calculate_backoff(40), Duration::from_secs(1));
}

#[test]
fn test_credentials_debug_redacts_key() {
    let rendered = format!("{:?}", Credentials::basic("super-secret"));
    assert!(!rendered.contains("super-secret"));
}

#[test]
fn test_inline_credentials_in_url() {
    let config = HttpClientConfig::builder()
        .base_url("https://onfleet.com/api/v2/")
        .build();
    let client = HttpClient::with_credentials(config, Credentials::inline("abc123")).unwrap();

    let url = client.build_url("workers").unwrap();
    assert_eq!(url.username(), "abc123");
    assert_eq!(url.password(), None);
    assert_eq!(url.path(), "/api/v2/workers");
}

// ============================================================================
// Request Tests
// ============================================================================

#[tokio::test]
async fn test_get_json_with_basic_auth() {
    let mock_server = MockServer::start().await;

    // base64("key:")
    Mock::given(method("GET"))
        .and(path("/api/v2/workers"))
        .and(header("authorization", "Basic a2V5Og=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "w1"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = fast_config(&format!("{}/api/v2/", mock_server.uri())).build();
    let client = HttpClient::with_credentials(config, Credentials::basic("key")).unwrap();

    let body = client.fetch("workers", &no_query()).await.unwrap();
    assert_eq!(body, json!([{"id": "w1"}]));
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_query_params_and_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tasks/all"))
        .and(query_param("from", "1672531200000"))
        .and(query_param("lastId", "abc"))
        .and(header("user-agent", "tap-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri())
        .user_agent("tap-test/0.1")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let query = vec![
        ("from".to_string(), "1672531200000".to_string()),
        ("lastId".to_string(), "abc".to_string()),
    ];
    let body = client.fetch("/tasks/all", &query).await.unwrap();
    assert_eq!(body["tasks"], json!([]));
}

#[tokio::test]
async fn test_retry_on_500_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hubs"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hubs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "h1"}])))
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri()).max_retries(3).build();
    let client = HttpClient::with_config(config).unwrap();

    let body = client.fetch("hubs", &no_query()).await.unwrap();
    assert_eq!(body[0]["id"], "h1");
}

#[tokio::test]
async fn test_retries_exhausted_surfaces_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hubs"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri()).max_retries(2).build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client.fetch("hubs", &no_query()).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri()).max_retries(5).build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client.fetch("teams", &no_query()).await.unwrap_err();
    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("Expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admins"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server.uri()).build()).unwrap();

    let err = client.fetch("admins", &no_query()).await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

// ============================================================================
// Quota Throttle Tests
// ============================================================================

#[tokio::test]
async fn test_low_quota_pauses_before_returning() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/workers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RateLimit-Remaining", "5")
                .insert_header("X-RateLimit-Limit", "100")
                .set_body_json(json!([])),
        )
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri())
        .quota(10.0, Duration::from_millis(50))
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let start = std::time::Instant::now();
    client.fetch("workers", &no_query()).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(client.throttle_count(), 1);
}

#[tokio::test]
async fn test_healthy_quota_does_not_pause() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/workers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RateLimit-Remaining", "50")
                .insert_header("X-RateLimit-Limit", "100")
                .set_body_json(json!([])),
        )
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri())
        .quota(10.0, Duration::from_secs(30))
        .build();
    let client = HttpClient::with_config(config).unwrap();

    client.fetch("workers", &no_query()).await.unwrap();
    assert_eq!(client.throttle_count(), 0);
}

// ============================================================================
// Transport Retry Tests
// ============================================================================

const FULL_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 13\r\nConnection: close\r\n\r\n[{\"id\":\"w1\"}]";

const TRUNCATED_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\nConnection: close\r\n\r\n[{\"id\":";

/// Raw TCP server answering connection `n` with `replies[n]`
///
/// `None` drops the connection without a byte; connections past the end of
/// the list reuse the last reply.
async fn raw_server(replies: Vec<Option<&'static str>>) -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let n = counter.fetch_add(1, AtomicOrdering::SeqCst);
            let reply = replies[n.min(replies.len() - 1)];

            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            if let Some(reply) = reply {
                let _ = socket.write_all(reply.as_bytes()).await;
            }
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}"), accepted)
}

#[tokio::test]
async fn test_dropped_connection_is_retried() {
    let (base_url, accepted) = raw_server(vec![None, None, Some(FULL_RESPONSE)]).await;

    let config = fast_config(&base_url).max_retries(2).build();
    let client = HttpClient::with_config(config).unwrap();

    let body = client.fetch("workers", &no_query()).await.unwrap();
    assert_eq!(body, json!([{"id": "w1"}]));
    assert_eq!(accepted.load(AtomicOrdering::SeqCst), 3);
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_dropped_connection_surfaces_after_retries() {
    let (base_url, accepted) = raw_server(vec![None]).await;

    let config = fast_config(&base_url).max_retries(2).build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client.fetch("workers", &no_query()).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)), "unexpected error {err:?}");
    assert_eq!(accepted.load(AtomicOrdering::SeqCst), 3);
    assert_eq!(client.request_count(), 0);
}

#[tokio::test]
async fn test_truncated_body_is_retried() {
    let (base_url, accepted) = raw_server(vec![Some(TRUNCATED_RESPONSE), Some(FULL_RESPONSE)]).await;

    let config = fast_config(&base_url).max_retries(1).build();
    let client = HttpClient::with_config(config).unwrap();

    let body = client.fetch("workers", &no_query()).await.unwrap();
    assert_eq!(body, json!([{"id": "w1"}]));
    assert_eq!(accepted.load(AtomicOrdering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "t1"}])))
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri())
        .timeout(Duration::from_millis(100))
        .max_retries(1)
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let body = client.fetch("teams", &no_query()).await.unwrap();
    assert_eq!(body, json!([{"id": "t1"}]));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_timeout_surfaces_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri())
        .timeout(Duration::from_millis(100))
        .max_retries(1)
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client.fetch("teams", &no_query()).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 100 }));
}
