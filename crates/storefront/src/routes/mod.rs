//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Health check
//! GET  /health/ready                   - Readiness check (database)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                           - Cart page
//! POST /cart/add                       - Add to cart (returns control, triggers cart-updated)
//! GET  /products/{id}/add-to-cart      - Add-to-cart control (cached fragment)
//!
//! # Checkout
//! GET  /checkout                       - Redirect to next incomplete step
//! GET  /checkout/{step}                - Step form
//! POST /checkout/{step}/submit         - Submit step (303 on success, 200 with errors)
//! GET  /checkout/summary               - Order summary
//! POST /checkout/confirm               - Place order
//! POST /checkout/reset                 - Abandon checkout
//! ```

pub mod cart;
pub mod checkout;
pub mod health;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::index))
        .route("/summary", get(checkout::summary))
        .route("/confirm", post(checkout::confirm))
        .route("/reset", post(checkout::reset))
        .route("/{step}", get(checkout::show))
        .route("/{step}/submit", post(checkout::submit))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/cart", cart_routes())
        .route("/products/{id}/add-to-cart", get(cart::control))
        .nest("/checkout", checkout_routes())
}

/// The complete application: routes, sessions, request IDs and tracing.
///
/// Sentry layers are added by the binary.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .layer(sessions)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}
