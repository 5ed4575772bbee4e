//! Checkout route handlers.
//!
//! Each step is a plain HTML form. A valid submission stores the answer,
//! completes the step and redirects (303) to the next incomplete step or the
//! summary. An invalid one re-renders the form with field errors (200) and
//! leaves the session alone.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use pantry_core::cart::Cart;
use pantry_core::checkout::{CheckoutFlow, CheckoutSession, NextStep, StepId, fields};
use pantry_core::shipping::{ShippingMethod, resolve};
use pantry_core::{Address, Price, ShippingMethodId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::forms::payment_method::payment_label;
use crate::forms::{
    AddressForm, Field, FieldErrors, FormAction, FormData, PaymentMethodForm, ShippingMethodForm,
    StepForm, StepSubmission,
};
use crate::models::session::{clear_checkout, load_cart, load_checkout, save_checkout};
use crate::routes::cart::{CartLineView, cart_lines};
use crate::state::AppState;

/// URL of the cart page, where an empty checkout sends the customer.
const CART_URL: &str = "/cart";
const SUMMARY_URL: &str = "/checkout/summary";

// =============================================================================
// Views
// =============================================================================

/// One entry of the step progress list.
#[derive(Clone)]
pub struct StepView {
    pub title: String,
    pub url: String,
    pub completed: bool,
    pub current: bool,
    pub reachable: bool,
}

fn step_url(id: StepId) -> String {
    format!("/checkout/{id}")
}

fn next_url(flow: &CheckoutFlow, checkout: &CheckoutSession) -> String {
    match flow.next_step(checkout) {
        NextStep::Step(step) => step_url(step.id),
        NextStep::Confirmation => SUMMARY_URL.to_string(),
    }
}

fn step_views(
    flow: &CheckoutFlow,
    checkout: &CheckoutSession,
    current: Option<StepId>,
) -> Vec<StepView> {
    flow.steps()
        .iter()
        .map(|step| StepView {
            title: step.title.clone(),
            url: step_url(step.id),
            completed: flow.status(checkout, step.id).is_completed(),
            current: Some(step.id) == current,
            reachable: flow.is_reachable(checkout, step.id),
        })
        .collect()
}

/// Checkout step page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/step.html")]
pub struct CheckoutStepTemplate {
    pub title: String,
    pub steps: Vec<StepView>,
    pub submit_url: String,
    pub back_url: Option<String>,
    pub fields: Vec<Field>,
    pub actions: Vec<FormAction>,
    /// Shown above the form, e.g. when no shipping method is available.
    pub notice: Option<String>,
}

/// Order summary template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/summary.html")]
pub struct SummaryTemplate {
    pub steps: Vec<StepView>,
    pub order: OrderView,
}

/// Order placed template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/placed.html")]
pub struct PlacedTemplate {
    pub order: OrderView,
}

/// Everything the customer chose, ready for display.
#[derive(Clone)]
pub struct OrderView {
    pub name: String,
    pub address: String,
    pub shipping: String,
    pub payment: String,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
}

// =============================================================================
// Step rendering
// =============================================================================

/// Render a step form, optionally with a rejected submission overlaid.
fn step_page<F: StepForm>(
    state: &AppState,
    checkout: &CheckoutSession,
    form: &F,
    rejected: Option<(&FormData, &FieldErrors)>,
    notice: Option<String>,
) -> CheckoutStepTemplate {
    let flow = state.flow();
    CheckoutStepTemplate {
        title: flow
            .step(F::STEP)
            .map_or_else(|| F::STEP.to_string(), |s| s.title.clone()),
        steps: step_views(flow, checkout, Some(F::STEP)),
        submit_url: format!("{}/submit", step_url(F::STEP)),
        back_url: flow.previous(F::STEP).map(|s| step_url(s.id)),
        fields: form.render_fields(checkout, state.hooks(), rejected),
        actions: form.build_actions(),
        notice,
    }
}

/// Resolve the shipping methods for the stored address.
///
/// Called once per request; the form renders and validates against the
/// same list.
async fn shipping_methods(
    state: &AppState,
    checkout: &CheckoutSession,
) -> Result<Vec<ShippingMethod>> {
    let catalog = state.catalog().shipping().await?;
    let address = checkout.get::<Address>(fields::SHIPPING_ADDRESS);
    Ok(resolve(catalog.as_ref(), address.as_ref()))
}

fn shipping_notice(form: &ShippingMethodForm<'_>) -> Option<String> {
    (!form.has_choices())
        .then(|| "No shipping method is available right now. Please contact us.".to_string())
}

/// Validate and apply a submission, or build the page to re-render.
fn apply<F: StepForm>(
    state: &AppState,
    checkout: &mut CheckoutSession,
    form: &F,
    data: &FormData,
    notice: Option<String>,
) -> Result<Option<CheckoutStepTemplate>> {
    match form.submit(state.flow(), checkout, data)? {
        StepSubmission::Accepted(outcome) => {
            tracing::debug!(step = %F::STEP, changed = outcome.changed, "step completed");
            Ok(None)
        }
        StepSubmission::Rejected(errors) => {
            tracing::debug!(step = %F::STEP, fields = ?errors.keys(), "step rejected");
            Ok(Some(step_page(state, checkout, form, Some((data, &errors)), notice)))
        }
    }
}

fn parse_step(raw: &str) -> Result<StepId> {
    raw.parse::<StepId>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Send the customer to the next incomplete step.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if load_cart(&session).await?.is_empty() {
        return Ok(Redirect::to(CART_URL));
    }
    let checkout = load_checkout(&session).await?;
    Ok(Redirect::to(&next_url(state.flow(), &checkout)))
}

/// Render a step form.
///
/// Steps after the next incomplete one redirect there instead.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(step): Path<String>,
) -> Result<Response> {
    let id = parse_step(&step)?;
    if load_cart(&session).await?.is_empty() {
        return Ok(Redirect::to(CART_URL).into_response());
    }

    let mut checkout = load_checkout(&session).await?;
    let flow = state.flow();
    if !flow.is_reachable(&checkout, id) {
        return Ok(Redirect::to(&next_url(flow, &checkout)).into_response());
    }

    flow.visit(&mut checkout, id)?;
    save_checkout(&session, &checkout).await?;

    let page = match id {
        StepId::Address => step_page(&state, &checkout, &AddressForm, None, None),
        StepId::Shipping => {
            let form = ShippingMethodForm::new(
                shipping_methods(&state, &checkout).await?,
                state.shipping_form(),
            );
            step_page(&state, &checkout, &form, None, shipping_notice(&form))
        }
        StepId::Payment => {
            let form = PaymentMethodForm::new(&state.config().checkout.payment_methods);
            step_page(&state, &checkout, &form, None, None)
        }
    };

    Ok(page.into_response())
}

/// Submit a step form.
#[instrument(skip(state, session, data))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Path(step): Path<String>,
    Form(data): Form<FormData>,
) -> Result<Response> {
    let id = parse_step(&step)?;
    if load_cart(&session).await?.is_empty() {
        return Ok(Redirect::to(CART_URL).into_response());
    }

    let mut checkout = load_checkout(&session).await?;
    if !state.flow().is_reachable(&checkout, id) {
        return Ok(Redirect::to(&next_url(state.flow(), &checkout)).into_response());
    }

    let rejected = match id {
        StepId::Address => apply(&state, &mut checkout, &AddressForm, &data, None)?,
        StepId::Shipping => {
            let form = ShippingMethodForm::new(
                shipping_methods(&state, &checkout).await?,
                state.shipping_form(),
            );
            let notice = shipping_notice(&form);
            apply(&state, &mut checkout, &form, &data, notice)?
        }
        StepId::Payment => {
            let form = PaymentMethodForm::new(&state.config().checkout.payment_methods);
            apply(&state, &mut checkout, &form, &data, None)?
        }
    };

    if let Some(page) = rejected {
        return Ok(page.into_response());
    }

    save_checkout(&session, &checkout).await?;
    add_breadcrumb("checkout", "Step completed", Some(&[("step", id.as_str())][..]));
    Ok(Redirect::to(&next_url(state.flow(), &checkout)).into_response())
}

/// Show everything the customer chose.
#[instrument(skip(state, session))]
pub async fn summary(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to(CART_URL).into_response());
    }

    let mut checkout = load_checkout(&session).await?;
    match build_order(&state, &mut checkout, &cart).await? {
        Some(order) => Ok(SummaryTemplate {
            steps: step_views(state.flow(), &checkout, None),
            order,
        }
        .into_response()),
        None => {
            save_checkout(&session, &checkout).await?;
            Ok(Redirect::to(&next_url(state.flow(), &checkout)).into_response())
        }
    }
}

/// Place the order: clear the checkout and the cart.
///
/// Orders are not persisted; placing one is logged.
#[instrument(skip(state, session))]
pub async fn confirm(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to(CART_URL).into_response());
    }

    let mut checkout = load_checkout(&session).await?;
    let Some(order) = build_order(&state, &mut checkout, &cart).await? else {
        save_checkout(&session, &checkout).await?;
        return Ok(Redirect::to(&next_url(state.flow(), &checkout)).into_response());
    };

    tracing::info!(
        lines = order.lines.len(),
        shipping = %order.shipping,
        payment = %order.payment,
        total = %order.total,
        "order placed"
    );
    clear_checkout(&session, true).await?;

    Ok(PlacedTemplate { order }.into_response())
}

/// Abandon the checkout; the cart is kept.
#[instrument(skip(session))]
pub async fn reset(session: Session) -> Result<Redirect> {
    clear_checkout(&session, false).await?;
    tracing::info!("checkout reset");
    Ok(Redirect::to("/checkout"))
}

// =============================================================================
// Order assembly
// =============================================================================

/// Assemble the order from the session.
///
/// Returns `None` when a step is still pending. A stored answer that is no
/// longer acceptable reopens its step, so the caller should save the
/// session and redirect.
async fn build_order(
    state: &AppState,
    checkout: &mut CheckoutSession,
    cart: &Cart,
) -> Result<Option<OrderView>> {
    let flow = state.flow();
    if !flow.is_finished(checkout) {
        return Ok(None);
    }

    let Some(address) = checkout.get::<Address>(fields::SHIPPING_ADDRESS) else {
        flow.reopen(checkout, StepId::Address)?;
        return Ok(None);
    };

    let offered = shipping_methods(state, checkout).await?;
    let method = checkout
        .get::<ShippingMethodId>(fields::SHIPPING_METHOD)
        .and_then(|id| offered.into_iter().find(|m| m.id == id));
    let Some(method) = method else {
        tracing::info!("stored shipping method no longer offered, reopening step");
        flow.reopen(checkout, StepId::Shipping)?;
        return Ok(None);
    };

    let payment = checkout
        .get::<String>(fields::PAYMENT_METHOD)
        .filter(|p| state.config().checkout.payment_methods.contains(p));
    let Some(payment) = payment else {
        flow.reopen(checkout, StepId::Payment)?;
        return Ok(None);
    };

    let currency = state.config().checkout.currency;
    let lines = cart_lines(state, cart).await?;
    let subtotal = lines.iter().map(|l| l.total.amount).sum::<Decimal>();
    let total = subtotal + method.fee.amount;

    Ok(Some(OrderView {
        name: address.full_name(),
        address: address.one_line(),
        shipping: method.label(),
        payment: payment_label(&payment),
        subtotal: Price::new(subtotal, currency).to_string(),
        shipping_fee: method.fee.to_string(),
        total: Price::new(total, currency).to_string(),
        lines,
    }))
}
