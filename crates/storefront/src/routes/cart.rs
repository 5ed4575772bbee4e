//! Cart route handlers.
//!
//! The add-to-cart control is an HTMX fragment. Its rendered HTML depends
//! only on the product and how much of it is in the cart, so it is cached
//! under the product's cache key.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use pantry_core::cart::{Cart, Product};
use pantry_core::{Price, ProductId};

use crate::error::{AppError, Result};
use crate::forms::add_to_cart::names;
use crate::forms::{AddToCartForm, Field, FieldErrors, FormAction, FormData};
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// HTMX event fired after the cart changed.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: String,
    pub unit: String,
    pub price: String,
    pub total: Price,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
}

/// Add-to-cart fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_to_cart.html")]
pub struct AddToCartTemplate {
    pub product_id: ProductId,
    pub title: String,
    pub price: String,
    pub in_cart: String,
    pub unit: String,
    pub fields: Vec<Field>,
    pub actions: Vec<FormAction>,
}

impl AddToCartTemplate {
    fn new(form: &AddToCartForm<'_>, fields: Vec<Field>) -> Self {
        let product = form.product();
        Self {
            product_id: product.id,
            title: product.title.clone(),
            price: product.price.to_string(),
            in_cart: form.in_cart().normalize().to_string(),
            unit: product.quantity_unit.title.clone(),
            fields,
            actions: form.actions(),
        }
    }
}

/// Display rows for every cart line whose product is still sold.
///
/// # Errors
///
/// Returns an error if a product lookup fails.
pub async fn cart_lines(state: &AppState, cart: &Cart) -> Result<Vec<CartLineView>> {
    let mut lines = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let Some(product) = state.catalog().product(line.product_id).await? else {
            tracing::warn!(product_id = %line.product_id, "cart holds unavailable product");
            continue;
        };
        lines.push(CartLineView {
            product_id: product.id,
            quantity: line.quantity.normalize().to_string(),
            unit: product.quantity_unit.title.clone(),
            price: product.price.to_string(),
            total: product.price.times(line.quantity),
            title: product.title,
        });
    }
    Ok(lines)
}

async fn active_product(state: &AppState, id: ProductId) -> Result<Product> {
    state
        .catalog()
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Rendered add-to-cart control, from the fragment cache when possible.
async fn cached_control(state: &AppState, form: &AddToCartForm<'_>) -> Result<Arc<str>> {
    let key = form.cache_key();
    if let Some(html) = state.catalog().cached_fragment(&key).await {
        tracing::debug!("Cache hit for add-to-cart fragment");
        return Ok(html);
    }

    let html: Arc<str> = AddToCartTemplate::new(form, form.fields()).render()?.into();
    state.catalog().store_fragment(key, Arc::clone(&html)).await;
    Ok(html)
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let cart = load_cart(&session).await?;
    let lines = cart_lines(&state, &cart).await?;
    let subtotal = lines.iter().map(|l| l.total.amount).sum::<Decimal>();

    Ok(CartShowTemplate {
        lines,
        subtotal: Price::new(subtotal, state.config().checkout.currency).to_string(),
    })
}

/// Add-to-cart control for a product (HTMX fragment, cached).
#[instrument(skip(state, session))]
pub async fn control(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Html<String>> {
    let product = active_product(&state, id).await?;
    let cart = load_cart(&session).await?;
    let form = AddToCartForm::new(
        &product,
        cart.quantity_of(id),
        state.config().checkout.max_line_quantity,
    );

    Ok(Html(cached_control(&state, &form).await?.to_string()))
}

/// Add item to cart (HTMX).
///
/// Returns the refreshed control and triggers `cart-updated`. A rejected
/// quantity re-renders the control with the error (200) and leaves the cart
/// unchanged.
#[instrument(skip(state, session, data))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(data): Form<FormData>,
) -> Result<Response> {
    let id = data
        .get(names::PRODUCT_ID)
        .and_then(|raw| raw.parse::<ProductId>().ok())
        .ok_or_else(|| AppError::BadRequest("missing or invalid product_id".to_string()))?;
    let product = active_product(&state, id).await?;
    let max = state.config().checkout.max_line_quantity;

    let mut cart = load_cart(&session).await?;
    let form = AddToCartForm::new(&product, cart.quantity_of(id), max);

    match form.submit(&mut cart, &data) {
        Ok(quantity) => {
            save_cart(&session, &cart).await?;
            tracing::info!(product_id = %id, %quantity, "added to cart");

            let refreshed = AddToCartForm::new(&product, quantity, max);
            let html = cached_control(&state, &refreshed).await?;
            Ok((
                AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
                Html(html.to_string()),
            )
                .into_response())
        }
        Err(errors) => Ok(rejected(&form, &data, &errors)?.into_response()),
    }
}

fn rejected(
    form: &AddToCartForm<'_>,
    data: &FormData,
    errors: &FieldErrors,
) -> Result<Html<String>> {
    let fields = form.rejected_fields(data, errors);
    Ok(Html(AddToCartTemplate::new(form, fields).render()?))
}
