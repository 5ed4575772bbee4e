//! Shipping methods, carriers, zones and eligibility resolution.
//!
//! A [`ShippingMethod`] belongs to a [`Carrier`] and delivers into one or more
//! [`Zone`]s. Which methods a customer may pick is decided by
//! [`resolve`]: methods whose zones cover the shipping address win, and when
//! none do, every active method is offered instead.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{Address, CarrierId, CountryCode, Price, ShippingMethodId, ZoneId};

/// A company that delivers parcels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: CarrierId,
    pub title: String,
}

/// A named set of destination countries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub title: String,
    pub countries: Vec<CountryCode>,
}

impl Zone {
    /// Whether the zone includes the given country.
    #[must_use]
    pub fn covers(&self, country: &CountryCode) -> bool {
        self.countries.contains(country)
    }
}

/// A carrier/fee option a customer may select for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub title: String,
    pub carrier: Carrier,
    pub fee: Price,
    pub is_active: bool,
    /// Destinations this method is allowed to ship to.
    pub zones: Vec<Zone>,
}

impl ShippingMethod {
    /// Whether any of this method's zones cover the address's country.
    #[must_use]
    pub fn delivers_to(&self, address: &Address) -> bool {
        self.zones.iter().any(|zone| zone.covers(&address.country))
    }

    /// Option label shown in the shipping step: `"{title} — {carrier}, {fee}"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} — {}, {}", self.title, self.carrier.title, self.fee)
    }
}

/// Source of shipping eligibility.
///
/// Implementations answer two questions: which methods the carrier/zone rules
/// allow for an address, and which methods are active at all.
pub trait ShippingRules {
    /// Active methods allowed for `address` by carrier and zone rules.
    ///
    /// An absent address matches nothing.
    fn allowed_for(&self, address: Option<&Address>) -> Vec<ShippingMethod>;

    /// Every active method, regardless of destination.
    fn active(&self) -> Vec<ShippingMethod>;
}

/// Resolve the shipping methods a customer may choose from.
///
/// Returns the address-eligible methods, or all active methods when the
/// address matches none. The result is empty only when no method is active.
pub fn resolve<R: ShippingRules + ?Sized>(
    rules: &R,
    address: Option<&Address>,
) -> Vec<ShippingMethod> {
    let allowed = rules.allowed_for(address);
    if !allowed.is_empty() {
        return allowed;
    }

    let active = rules.active();
    tracing::debug!(
        country = address.map(|a| a.country.as_str()),
        fallback_count = active.len(),
        "no zone matched address, offering all active shipping methods"
    );
    active
}

/// In-memory shipping catalog.
///
/// Holds a snapshot of all methods (active or not) and answers
/// [`ShippingRules`] queries against it. Results are ordered by fee, then
/// title, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingCatalog {
    methods: Vec<ShippingMethod>,
}

impl ShippingCatalog {
    #[must_use]
    pub fn new(mut methods: Vec<ShippingMethod>) -> Self {
        methods.sort_by(display_order);
        Self { methods }
    }

    /// All methods in the catalog, including inactive ones.
    #[must_use]
    pub fn methods(&self) -> &[ShippingMethod] {
        &self.methods
    }

    #[must_use]
    pub fn get(&self, id: ShippingMethodId) -> Option<&ShippingMethod> {
        self.methods.iter().find(|m| m.id == id)
    }
}

impl ShippingRules for ShippingCatalog {
    fn allowed_for(&self, address: Option<&Address>) -> Vec<ShippingMethod> {
        let Some(address) = address else {
            return Vec::new();
        };

        self.methods
            .iter()
            .filter(|m| m.is_active && m.delivers_to(address))
            .cloned()
            .collect()
    }

    fn active(&self) -> Vec<ShippingMethod> {
        self.methods.iter().filter(|m| m.is_active).cloned().collect()
    }
}

fn display_order(a: &ShippingMethod, b: &ShippingMethod) -> Ordering {
    a.fee
        .amount
        .cmp(&b.fee.amount)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}
