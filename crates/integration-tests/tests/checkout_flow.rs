//! Integration tests for the multi-step checkout.
//!
//! Each test drives the full storefront router with a fixed catalog and an
//! in-memory session store.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use pantry_core::CountryCode;
use pantry_core::checkout::StaleAnswerPolicy;
use pantry_integration_tests::{
    DHL, EXPRESS, POSTNL, RICE, TestClient, app, app_with, shipping_methods, test_config,
};

async fn client_with_cart() -> TestClient {
    let mut client = TestClient::new(app());
    let response = client.add_to_cart(RICE, "1").await;
    assert_eq!(response.status, StatusCode::OK);
    client
}

async fn complete_checkout(client: &mut TestClient) {
    client.submit_address("NL").await.assert_redirect("/checkout/shipping");
    client.submit_shipping(POSTNL).await.assert_redirect("/checkout/payment");
    client.submit_payment("invoice").await.assert_redirect("/checkout/summary");
}

// ============================================================================
// Entry and navigation
// ============================================================================

#[tokio::test]
async fn test_empty_cart_redirects_to_cart() {
    let mut client = TestClient::new(app());

    client.get("/checkout").await.assert_redirect("/cart");
    client.get("/checkout/address").await.assert_redirect("/cart");
    client.get("/checkout/summary").await.assert_redirect("/cart");
}

#[tokio::test]
async fn test_checkout_starts_at_first_step() {
    let mut client = client_with_cart().await;

    client.get("/checkout").await.assert_redirect("/checkout/address");

    let page = client.get("/checkout/address").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("action=\"/checkout/address/submit\""));
    assert!(page.body.contains("name=\"first_name\""));
}

#[tokio::test]
async fn test_later_steps_redirect_until_earlier_ones_are_complete() {
    let mut client = client_with_cart().await;

    client.get("/checkout/payment").await.assert_redirect("/checkout/address");
    client
        .submit_payment("invoice")
        .await
        .assert_redirect("/checkout/address");

    client.submit_address("NL").await;
    client.get("/checkout/payment").await.assert_redirect("/checkout/shipping");
}

#[tokio::test]
async fn test_unknown_step_is_not_found() {
    let mut client = client_with_cart().await;

    let response = client.get("/checkout/gift-wrap").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_completed_steps_stay_reachable() {
    let mut client = client_with_cart().await;
    complete_checkout(&mut client).await;

    let page = client.get("/checkout/address").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("value=\"Lovelace\""));
}

// ============================================================================
// Submitting steps
// ============================================================================

#[tokio::test]
async fn test_full_checkout_reaches_summary() {
    let mut client = client_with_cart().await;
    complete_checkout(&mut client).await;

    client.get("/checkout").await.assert_redirect("/checkout/summary");

    let summary = client.get("/checkout/summary").await;
    assert_eq!(summary.status, StatusCode::OK);
    assert!(summary.body.contains("Ada Lovelace"));
    assert!(summary.body.contains("Standard — PostNL, $6.95"));
    assert!(summary.body.contains("Invoice"));
    assert!(summary.body.contains("$11.15"));
}

#[tokio::test]
async fn test_invalid_submission_rerenders_with_errors() {
    let mut client = client_with_cart().await;

    let response = client
        .post(
            "/checkout/address/submit",
            &[
                ("first_name", "Ada"),
                ("last_name", "Lovelace"),
                ("street", "Keizersgracht 1"),
                ("postcode", "1015 CJ"),
                ("city", "  "),
                ("country", "NLD"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Please enter a city."));
    assert!(response.body.contains("value=\"Ada\""));

    // Nothing was stored
    client.get("/checkout/shipping").await.assert_redirect("/checkout/address");
}

#[tokio::test]
async fn test_resubmitting_the_same_answer_keeps_later_steps() {
    let mut client = client_with_cart().await;
    complete_checkout(&mut client).await;

    client.submit_address("NL").await.assert_redirect("/checkout/summary");
    client.submit_shipping(POSTNL).await.assert_redirect("/checkout/summary");
}

#[tokio::test]
async fn test_changed_answer_reopens_later_steps() {
    let mut client = client_with_cart().await;
    complete_checkout(&mut client).await;

    client.submit_address("DE").await.assert_redirect("/checkout/shipping");
    client.get("/checkout/summary").await.assert_redirect("/checkout/shipping");
    client.get("/checkout/payment").await.assert_redirect("/checkout/shipping");

    client.submit_shipping(DHL).await.assert_redirect("/checkout/payment");
}

#[tokio::test]
async fn test_retained_answer_is_preselected_after_reset() {
    let mut client = client_with_cart().await;
    client.submit_address("NL").await;
    client.submit_shipping(EXPRESS).await;

    client.submit_address("BE").await.assert_redirect("/checkout/shipping");

    let page = client.get("/checkout/shipping").await;
    assert!(page.body.contains(&format!("value=\"{EXPRESS}\" selected")));
}

#[tokio::test]
async fn test_discarded_answer_falls_back_to_default_choice() {
    let mut config = test_config();
    config.checkout.stale_answers = StaleAnswerPolicy::Discard;
    let mut client = TestClient::new(app_with(config, shipping_methods()));
    client.add_to_cart(RICE, "1").await;

    client.submit_address("NL").await;
    client.submit_shipping(EXPRESS).await;
    client.submit_address("BE").await.assert_redirect("/checkout/shipping");

    let page = client.get("/checkout/shipping").await;
    assert!(page.body.contains(&format!("value=\"{POSTNL}\" selected")));
    assert!(!page.body.contains(&format!("value=\"{EXPRESS}\" selected")));
}

#[tokio::test]
async fn test_default_country_is_prefilled() {
    let mut config = test_config();
    config.checkout.default_country = Some(CountryCode::parse("NL").unwrap());
    let mut client = TestClient::new(app_with(config, shipping_methods()));
    client.add_to_cart(RICE, "1").await;

    let page = client.get("/checkout/address").await;
    assert!(page.body.contains("name=\"country\" value=\"NL\""));
}

#[tokio::test]
async fn test_unknown_payment_method_is_rejected() {
    let mut client = client_with_cart().await;
    client.submit_address("NL").await;
    client.submit_shipping(POSTNL).await;

    let response = client.submit_payment("bitcoin").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("This payment method is not available."));
}

// ============================================================================
// Summary, confirm and reset
// ============================================================================

#[tokio::test]
async fn test_confirm_places_order_and_empties_cart() {
    let mut client = client_with_cart().await;
    complete_checkout(&mut client).await;

    let placed = client.post("/checkout/confirm", &[]).await;
    assert_eq!(placed.status, StatusCode::OK);
    assert!(placed.body.contains("your order has been placed"));
    assert!(placed.body.contains("Basmati rice"));

    let cart = client.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty."));
    client.get("/checkout").await.assert_redirect("/cart");
}

#[tokio::test]
async fn test_confirm_before_finishing_redirects_to_pending_step() {
    let mut client = client_with_cart().await;
    client.submit_address("NL").await;

    client
        .post("/checkout/confirm", &[])
        .await
        .assert_redirect("/checkout/shipping");
}

#[tokio::test]
async fn test_reset_clears_answers_but_keeps_cart() {
    let mut client = client_with_cart().await;
    complete_checkout(&mut client).await;

    client.post("/checkout/reset", &[]).await.assert_redirect("/checkout");
    client.get("/checkout").await.assert_redirect("/checkout/address");

    let page = client.get("/checkout/address").await;
    assert!(!page.body.contains("Lovelace"));

    let cart = client.get("/cart").await;
    assert!(cart.body.contains("Basmati rice"));
}
