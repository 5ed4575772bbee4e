//! Shipping address type.

use serde::{Deserialize, Serialize};

use super::country::CountryCode;

/// A delivery address collected during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub country: CountryCode,
}

impl Address {
    /// Full name for display, e.g. on the summary page.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Single-line rendering: `street, postcode city, COUNTRY`.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!(
            "{}, {} {}, {}",
            self.street, self.postcode, self.city, self.country
        )
    }
}
