//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use pantry_core::checkout::{CheckoutFlow, StepId};

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::forms::address::default_country_hook;
use crate::forms::{FormHooks, ShippingMethodFormConfig};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog and configuration. Everything is
/// fixed at construction; nothing is registered globally.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    flow: CheckoutFlow,
    hooks: FormHooks,
    shipping_form: ShippingMethodFormConfig,
}

impl AppState {
    /// Create application state backed by Postgres.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let catalog = Catalog::postgres(pool, config.checkout.currency, config.catalog_ttl);
        Self::with_catalog(config, catalog)
    }

    /// Create application state around an existing catalog.
    #[must_use]
    pub fn with_catalog(config: StorefrontConfig, catalog: Catalog) -> Self {
        let flow = CheckoutFlow::standard().with_policy(config.checkout.stale_answers);

        let mut hooks = FormHooks::new();
        if let Some(country) = config.checkout.default_country.clone() {
            hooks.register(StepId::Address, default_country_hook(country));
        }

        tracing::debug!(
            steps = flow.steps().len(),
            policy = ?flow.policy(),
            address_hooks = hooks.count(StepId::Address),
            "checkout configured"
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                flow,
                hooks,
                shipping_form: ShippingMethodFormConfig::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// The checkout steps and their reset policy.
    #[must_use]
    pub fn flow(&self) -> &CheckoutFlow {
        &self.inner.flow
    }

    /// Field hooks registered for the step forms.
    #[must_use]
    pub fn hooks(&self) -> &FormHooks {
        &self.inner.hooks
    }

    #[must_use]
    pub fn shipping_form(&self) -> &ShippingMethodFormConfig {
        &self.inner.shipping_form
    }
}
