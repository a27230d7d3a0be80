//! End-to-end tests against a server bound to a real socket.

use std::net::SocketAddr;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use rest_mock_rs::client::ClientError;
use rest_mock_rs::http::{build_router, AppState};
use rest_mock_rs::{Expectation, MockClient, ParamValue, Repetition};

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, build_router(AppState::new())).await.expect("serve");
    });
    addr
}

/// Test setting, reading back and clearing expectations through the client.
#[tokio::test]
async fn test_client_manages_queue() {
    let addr = spawn_server().await;
    let client = MockClient::from_addr(addr);

    assert!(client.expected_requests().await.expect("list").is_empty());

    let expectations = vec![
        Expectation::new("GET", "/storage_service/compaction_throughput")
            .with_repetition(Repetition::Any)
            .with_response(json!(16)),
        Expectation::new("POST", "/storage_service/compaction_throughput")
            .with_param("value", ParamValue::approximate(32.0, 0.5)),
    ];
    client.set_expected_requests(&expectations).await.expect("set");
    assert_eq!(client.expected_requests().await.expect("list"), expectations);

    client.clear_expected_requests().await.expect("clear");
    assert!(client.expected_requests().await.expect("list").is_empty());
}

/// Test a harness-style run: configure, exercise, then assert nothing is left.
#[tokio::test]
async fn test_expectations_consumed_over_network() {
    let addr = spawn_server().await;
    let client = MockClient::from_addr(addr);
    client
        .set_expected_requests(&[
            Expectation::new("GET", "/storage_service/host_id").with_response(json!({"id": 7})),
            Expectation::new("POST", "/storage_service/repair_async/ks")
                .with_param("primaryRange", "true"),
        ])
        .await
        .expect("set");

    let http = reqwest::Client::new();
    let body: Value = http
        .get(format!("http://{addr}/storage_service/host_id"))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(body, json!({"id": 7}));

    let resp = http
        .post(format!("http://{addr}/storage_service/repair_async/ks?primaryRange=true"))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status().as_u16(), 200);

    assert!(client.expected_requests().await.expect("list").is_empty());
}

/// Test that control plane failures surface as status errors.
#[tokio::test]
async fn test_client_reports_status_errors() {
    let addr = spawn_server().await;
    let client = MockClient::from_addr(addr);

    let http = reqwest::Client::new();
    let resp = http
        .post(format!("http://{addr}/__expected_requests__"))
        .body("[{\"method\": 1}]")
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status().as_u16(), 400);

    let unreachable = MockClient::new("http://127.0.0.1:1");
    let err = unreachable.clear_expected_requests().await.expect_err("nothing listening");
    assert!(matches!(err, ClientError::Request(_)));

    // The server is still healthy after the bad request
    client.clear_expected_requests().await.expect("clear");
}
