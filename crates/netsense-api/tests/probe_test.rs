// Integration tests for the download and reachability probes.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use netsense_api::{Error, ProbeClient, TransportConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> ProbeClient {
    ProbeClient::new(&TransportConfig::default().with_read_timeout(Duration::from_secs(5))).unwrap()
}

async fn setup() -> (MockServer, ProbeClient) {
    let server = MockServer::start().await;
    (server, client())
}

#[tokio::test]
async fn test_download_reads_full_body() {
    let (server, probe) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bytes/4096"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .expect(1)
        .mount(&server)
        .await;

    let sample = probe
        .download(&format!("{}/bytes/4096", server.uri()))
        .await
        .unwrap();

    assert_eq!(sample.bytes, 4096);
    assert_eq!(sample.status, 200);
}

#[tokio::test]
async fn test_download_error_status_still_yields_sample() {
    let (server, probe) = setup().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let sample = probe
        .download(&format!("{}/missing", server.uri()))
        .await
        .unwrap();

    assert_eq!(sample.status, 404);
    assert_eq!(sample.bytes, 8);
}

#[tokio::test]
async fn test_download_slow_body_is_timed() {
    let (server, probe) = setup().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 1024])
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let sample = probe
        .download(&format!("{}/slow", server.uri()))
        .await
        .unwrap();

    assert!(sample.elapsed >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_download_connection_refused_is_transport_error() {
    let probe = client();
    let err = probe.download("http://127.0.0.1:1/bytes").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_download_rejects_bad_url() {
    let probe = client();
    let err = probe.download("not a url").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[tokio::test]
async fn test_reachability_against_listening_socket() {
    let server = MockServer::start().await;
    let addr = server.address();
    let probe = client();

    let sample = probe
        .measure_reachability(&addr.ip().to_string(), addr.port(), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(sample.reachable);
    assert!(sample.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_reachability_refused_still_reports_elapsed() {
    let probe = client();
    let sample = probe
        .measure_reachability("127.0.0.1", 1, Duration::from_secs(2))
        .await
        .unwrap();

    assert!(!sample.reachable);
    assert!(sample.elapsed < Duration::from_secs(2));
}

#[tokio::test]
async fn test_reachability_unresolvable_host() {
    let probe = client();
    let err = probe
        .measure_reachability("host.invalid", 53, Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unresolvable { .. }));
}

#[tokio::test]
async fn test_download_stalled_past_read_timeout_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stalled"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 1024])
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let probe =
        ProbeClient::new(&TransportConfig::default().with_read_timeout(Duration::from_secs(1)))
            .unwrap();
    let err = probe
        .download(&format!("{}/stalled", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_download_within_read_timeout_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/steady"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 1024])
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let probe =
        ProbeClient::new(&TransportConfig::default().with_read_timeout(Duration::from_secs(1)))
            .unwrap();
    let sample = probe
        .download(&format!("{}/steady", server.uri()))
        .await
        .unwrap();

    assert_eq!(sample.bytes, 1024);
    assert!(sample.elapsed >= Duration::from_millis(300));
}
