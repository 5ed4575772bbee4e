//! Checkout step identifiers and definitions.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Session field names written by the step forms.
pub mod fields {
    /// Key for the shipping address chosen in the address step.
    pub const SHIPPING_ADDRESS: &str = "ShippingAddress";

    /// Key for the shipping method id chosen in the shipping step.
    pub const SHIPPING_METHOD: &str = "ShippingMethod";

    /// Key for the payment method name chosen in the payment step.
    pub const PAYMENT_METHOD: &str = "PaymentMethod";
}

/// Identifies a checkout step. Also used as the URL slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Address,
    Shipping,
    Payment,
}

impl StepId {
    /// URL slug, e.g. `shipping` in `/checkout/shipping`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Shipping => "shipping",
            Self::Payment => "payment",
        }
    }

    /// Session fields this step's form writes.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Address => &[fields::SHIPPING_ADDRESS],
            Self::Shipping => &[fields::SHIPPING_METHOD],
            Self::Payment => &[fields::PAYMENT_METHOD],
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slug that names no checkout step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown checkout step: {0}")]
pub struct UnknownStep(pub String);

impl std::str::FromStr for StepId {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(Self::Address),
            "shipping" => Ok(Self::Shipping),
            "payment" => Ok(Self::Payment),
            other => Err(UnknownStep(other.to_owned())),
        }
    }
}

/// A configured stage in the checkout sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: StepId,
    /// Position in the sequence; lower runs first.
    pub order: u32,
    pub title: String,
}

impl StepDefinition {
    #[must_use]
    pub fn new(id: StepId, order: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            order,
            title: title.into(),
        }
    }
}
