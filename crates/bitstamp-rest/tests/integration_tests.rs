//! Integration tests for the Bitstamp REST gateway
//!
//! The mock-transport tests run everywhere. Tests marked `#[ignore]` hit the
//! live public API.
//! Run with: cargo test -p bitstamp-rest --test integration_tests -- --ignored

use bitstamp_rest::{
    CallError, CallGateway, FailureKind, GatewayConfig, HttpMethod, MockHttpTransport,
    OperationRequest, RateLimitConfig, TransactionsWindow,
};
use bitstamp_types::Pair;
use std::sync::Arc;
use std::time::Duration;

fn mock_gateway(limit: u32) -> (CallGateway, Arc<MockHttpTransport>) {
    let transport = Arc::new(MockHttpTransport::new());
    let config = GatewayConfig::new()
        .with_base_urls("https://mock.test/api/v2", "https://mock.test/api")
        .with_rate_limit(RateLimitConfig::new(limit, Duration::from_secs(60)));
    let gateway = CallGateway::with_transport(config, transport.clone(), None).unwrap();
    (gateway, transport)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_share_one_budget() {
    let (gateway, transport) = mock_gateway(5);
    for _ in 0..20 {
        transport.push(200, "{}");
    }
    let gateway = Arc::new(gateway);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .call("ticker/", HttpMethod::Get, None, false, false)
                    .await
            })
        })
        .collect();

    let mut allowed = 0;
    let mut limited = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => allowed += 1,
            Err(e) => {
                assert_eq!(e.kind(), Some(FailureKind::RateLimitExceeded));
                limited += 1;
            }
        }
    }

    assert_eq!(allowed, 5);
    assert_eq!(limited, 15);
    assert_eq!(transport.call_count(), 5);
    assert_eq!(gateway.budget().total_calls(), 20);
}

#[tokio::test]
async fn test_transactions_query_string() {
    let (gateway, transport) = mock_gateway(60);
    transport.push(200, "[]");

    gateway
        .execute(&OperationRequest::transactions(
            Some(Pair::ETH_USD),
            TransactionsWindow::Minute,
        ))
        .await
        .unwrap();

    assert_eq!(
        transport.requests()[0].url,
        "https://mock.test/api/v2/transactions/ethusd/?time=minute"
    );
}

#[tokio::test]
async fn test_error_body_is_preserved() {
    let (gateway, transport) = mock_gateway(60);
    transport.push(404, r#"{"detail":"Not found"}"#);

    let err = gateway
        .execute(&OperationRequest::ticker(Some("nopair")))
        .await
        .unwrap_err();
    match err {
        CallError::Http { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Fetch the live BTC/USD ticker
#[tokio::test]
#[ignore = "Makes real HTTP request"]
async fn test_live_ticker() {
    let gateway = CallGateway::new().unwrap();
    let response = gateway
        .execute(&OperationRequest::ticker(Some(Pair::BTC_USD)))
        .await
        .unwrap();

    let body = response.json().expect("ticker is JSON");
    assert!(body.get("last").is_some());
    assert_eq!(gateway.budget().total_calls(), 1);
    gateway.close();
}

/// Fetch the live order book
#[tokio::test]
#[ignore = "Makes real HTTP request"]
async fn test_live_order_book() {
    let gateway = CallGateway::new().unwrap();
    let response = gateway
        .execute(&OperationRequest::order_book(Some(Pair::BTC_EUR)))
        .await
        .unwrap();

    let body = response.json().expect("order book is JSON");
    assert!(body["bids"].is_array());
    assert!(body["asks"].is_array());
}
