//! Integration tests for the shipping step.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use pantry_integration_tests::{
    DHL, EXPRESS, POSTNL, RICE, TestClient, app, app_with, test_config,
};

async fn at_shipping_step(client: &mut TestClient, country: &str) {
    client.add_to_cart(RICE, "1").await;
    client
        .submit_address(country)
        .await
        .assert_redirect("/checkout/shipping");
}

#[tokio::test]
async fn test_only_methods_for_the_destination_are_offered() {
    let mut client = TestClient::new(app());
    at_shipping_step(&mut client, "DE").await;

    let page = client.get("/checkout/shipping").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Paket — DHL, $5.90"));
    assert!(!page.body.contains("PostNL"));
}

#[tokio::test]
async fn test_cheapest_method_is_selected_by_default() {
    let mut client = TestClient::new(app());
    at_shipping_step(&mut client, "NL").await;

    let page = client.get("/checkout/shipping").await;
    assert!(page.body.contains(&format!("value=\"{POSTNL}\" selected")));
    assert!(page.body.contains(&format!("value=\"{EXPRESS}\"")));
    assert!(!page.body.contains(&format!("value=\"{DHL}\"")));
}

#[tokio::test]
async fn test_uncovered_destination_falls_back_to_all_active_methods() {
    let mut client = TestClient::new(app());
    at_shipping_step(&mut client, "FR").await;

    let page = client.get("/checkout/shipping").await;
    for id in [POSTNL, DHL, EXPRESS] {
        assert!(page.body.contains(&format!("value=\"{id}\"")), "missing {id}");
    }

    client.submit_shipping(DHL).await.assert_redirect("/checkout/payment");
}

#[tokio::test]
async fn test_method_for_another_destination_is_rejected() {
    let mut client = TestClient::new(app());
    at_shipping_step(&mut client, "DE").await;

    let response = client.submit_shipping(POSTNL).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .body
            .contains("This shipping method is not available for your address.")
    );

    client.get("/checkout/payment").await.assert_redirect("/checkout/shipping");
}

#[tokio::test]
async fn test_missing_choice_is_rejected() {
    let mut client = TestClient::new(app());
    at_shipping_step(&mut client, "NL").await;

    let response = client.post("/checkout/shipping/submit", &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Please choose a shipping method."));
}

#[tokio::test]
async fn test_no_shipping_methods_blocks_the_step() {
    let mut client = TestClient::new(app_with(test_config(), Vec::new()));
    at_shipping_step(&mut client, "NL").await;

    let page = client.get("/checkout/shipping").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("No shipping method is available right now."));

    let response = client.submit_shipping(POSTNL).await;
    assert_eq!(response.status, StatusCode::OK);
    client.get("/checkout/payment").await.assert_redirect("/checkout/shipping");
}
