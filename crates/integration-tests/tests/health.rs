//! Integration tests for the health endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use pantry_integration_tests::{TestClient, app};

#[tokio::test]
async fn test_health_and_readiness() {
    let mut client = TestClient::new(app());

    assert_eq!(client.get("/health").await.status, StatusCode::OK);
    assert_eq!(client.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_carries_a_request_id() {
    let mut client = TestClient::new(app());

    let first = client.get("/health").await.request_id.unwrap();
    let second = client.get("/cart").await.request_id.unwrap();
    assert!(!first.is_empty());
    assert_ne!(first, second);
}
