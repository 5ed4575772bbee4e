//! Integration test harness for Pantry.
//!
//! Tests drive the complete storefront router in-process: a fixed catalog
//! stands in for Postgres and sessions live in a `MemoryStore`. The
//! [`TestClient`] carries the session cookie between requests the way a
//! browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pantry-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::{Url, form_urlencoded};

use pantry_core::cart::{Product, QuantityUnit};
use pantry_core::shipping::{Carrier, ShippingCatalog, ShippingMethod, Zone};
use pantry_core::checkout::fields;
use pantry_core::{
    CarrierId, CountryCode, CurrencyCode, Price, ProductId, QuantityUnitId, ShippingMethodId,
    ZoneId,
};
use pantry_storefront::catalog::Catalog;
use pantry_storefront::config::{CheckoutConfig, LogFormat, StorefrontConfig};
use pantry_storefront::middleware::request_id::REQUEST_ID_HEADER;
use pantry_storefront::middleware::session_layer;
use pantry_storefront::routes;
use pantry_storefront::state::AppState;

pub const CURRENCY: CurrencyCode = CurrencyCode::USD;

/// Rice, sold by the kilogram (three decimals).
pub const RICE: ProductId = ProductId::new(1);
/// Tea tins, sold by the piece.
pub const TEA: ProductId = ProductId::new(2);
/// A product that is no longer sold.
pub const RETIRED: ProductId = ProductId::new(3);

/// Ships to the Benelux zone only.
pub const POSTNL: ShippingMethodId = ShippingMethodId::new(10);
/// Ships to Germany only.
pub const DHL: ShippingMethodId = ShippingMethodId::new(11);
/// Ships to the Benelux zone, more expensive than `POSTNL`.
pub const EXPRESS: ShippingMethodId = ShippingMethodId::new(12);

/// Storefront configuration for tests. Nothing is read from the environment.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: Url::parse("http://localhost:3000").unwrap(),
        checkout: CheckoutConfig::default(),
        catalog_ttl: Duration::from_secs(60),
        log_format: LogFormat::default(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

fn unit(id: i32, title: &str, decimal_places: u32) -> QuantityUnit {
    QuantityUnit {
        id: QuantityUnitId::new(id),
        title: title.to_string(),
        decimal_places,
    }
}

fn product(id: ProductId, title: &str, cents: i64, unit: QuantityUnit, active: bool) -> Product {
    Product {
        id,
        title: title.to_string(),
        price: Price::from_cents(cents, CURRENCY),
        last_edited: Utc::now(),
        quantity_unit: unit,
        is_active: active,
    }
}

/// Products of the test catalog.
#[must_use]
pub fn products() -> Vec<Product> {
    vec![
        product(RICE, "Basmati rice", 420, unit(1, "kg", 3), true),
        product(TEA, "Tea tin", 1200, unit(2, "piece", 0), true),
        product(RETIRED, "Old jam", 300, unit(2, "piece", 0), false),
    ]
}

fn zone(id: i32, title: &str, countries: &[&str]) -> Zone {
    Zone {
        id: ZoneId::new(id),
        title: title.to_string(),
        countries: countries
            .iter()
            .map(|c| CountryCode::parse(c).unwrap())
            .collect(),
    }
}

fn method(
    id: ShippingMethodId,
    title: &str,
    carrier: &str,
    cents: i64,
    zones: Vec<Zone>,
) -> ShippingMethod {
    ShippingMethod {
        id,
        title: title.to_string(),
        carrier: Carrier {
            id: CarrierId::new(id.as_i32()),
            title: carrier.to_string(),
        },
        fee: Price::from_cents(cents, CURRENCY),
        is_active: true,
        zones,
    }
}

/// Shipping methods of the test catalog.
#[must_use]
pub fn shipping_methods() -> Vec<ShippingMethod> {
    let benelux = zone(1, "Benelux", &["BE", "NL", "LU"]);
    let germany = zone(2, "Germany", &["DE"]);
    vec![
        method(POSTNL, "Standard", "PostNL", 695, vec![benelux.clone()]),
        method(DHL, "Paket", "DHL", 590, vec![germany]),
        method(EXPRESS, "Express", "PostNL", 1495, vec![benelux]),
    ]
}

/// The storefront router over the given catalog and configuration.
#[must_use]
pub fn app_with(config: StorefrontConfig, shipping: Vec<ShippingMethod>) -> Router {
    router(state_with(config, products(), shipping))
}

/// Application state over a fixed catalog of `products` and `shipping`.
#[must_use]
pub fn state_with(
    config: StorefrontConfig,
    products: Vec<Product>,
    shipping: Vec<ShippingMethod>,
) -> AppState {
    let ttl = config.catalog_ttl;
    let catalog = Catalog::fixed(products, ShippingCatalog::new(shipping), ttl);
    AppState::with_catalog(config, catalog)
}

/// The storefront router over `state`, with in-memory sessions.
#[must_use]
pub fn router(state: AppState) -> Router {
    routes::app(state, session_layer(MemoryStore::default(), false))
}

/// The storefront router with the default test catalog.
#[must_use]
pub fn app() -> Router {
    app_with(test_config(), shipping_methods())
}

/// A response reduced to what the tests look at.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub hx_trigger: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Assert a 303 redirect to `path`.
    pub fn assert_redirect(&self, path: &str) {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "body: {}", self.body);
        assert_eq!(self.location.as_deref(), Some(path));
    }
}

/// A browser-like client: remembers the session cookie.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub const fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri);
        self.send(request, Body::empty()).await
    }

    /// POST an urlencoded form.
    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let request =
            Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(request, Body::from(body)).await
    }

    async fn send(
        &mut self,
        mut request: axum::http::request::Builder,
        body: Body,
    ) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let header_value = |name: &str| {
            response
                .headers()
                .get(name)
                .map(|v| v.to_str().unwrap().to_string())
        };
        let status = response.status();
        let location = header_value("location");
        let hx_trigger = header_value("hx-trigger");
        let request_id = header_value(REQUEST_ID_HEADER);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            location,
            hx_trigger,
            request_id,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// Put `quantity` of `product` in the cart.
    pub async fn add_to_cart(&mut self, product: ProductId, quantity: &str) -> TestResponse {
        let id = product.to_string();
        self.post("/cart/add", &[("product_id", id.as_str()), ("quantity", quantity)])
            .await
    }

    /// Submit the address step with a delivery address in `country`.
    pub async fn submit_address(&mut self, country: &str) -> TestResponse {
        self.post(
            "/checkout/address/submit",
            &[
                ("first_name", "Ada"),
                ("last_name", "Lovelace"),
                ("street", "Keizersgracht 1"),
                ("postcode", "1015 CJ"),
                ("city", "Amsterdam"),
                ("country", country),
            ],
        )
        .await
    }

    pub async fn submit_shipping(&mut self, method: ShippingMethodId) -> TestResponse {
        let id = method.to_string();
        self.post("/checkout/shipping/submit", &[(fields::SHIPPING_METHOD, id.as_str())])
            .await
    }

    pub async fn submit_payment(&mut self, payment: &str) -> TestResponse {
        self.post("/checkout/payment/submit", &[(fields::PAYMENT_METHOD, payment)])
            .await
    }
}
