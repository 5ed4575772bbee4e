//! Products, cart lines and add-to-cart rules.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{Price, ProductId, QuantityUnitId};

/// Unit a product is sold in, e.g. "piece" or "kg".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityUnit {
    pub id: QuantityUnitId,
    pub title: String,
    /// Fraction digits a quantity may carry; 0 means whole units only.
    pub decimal_places: u32,
}

/// A sellable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub last_edited: DateTime<Utc>,
    pub quantity_unit: QuantityUnit,
    pub is_active: bool,
}

impl Product {
    /// Render cache key for this product's add-to-cart control.
    #[must_use]
    pub fn cache_key(&self, quantity_in_cart: Decimal) -> String {
        cache_key(self.id, self.last_edited, quantity_in_cart)
    }
}

/// Cache key for a rendered add-to-cart control.
///
/// SHA-256 over `"{id}_{last_edited_micros}_{quantity}"`, hex encoded. Any
/// change to the product or to how many of it sit in the cart yields a new
/// key. Quantities are normalized first, so `2` and `2.00` share a key.
#[must_use]
pub fn cache_key(id: ProductId, last_edited: DateTime<Utc>, quantity_in_cart: Decimal) -> String {
    let input = format!(
        "{}_{}_{}",
        id,
        last_edited.timestamp_micros(),
        quantity_in_cart.normalize()
    );
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Reasons an entered quantity is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("Please enter a quantity.")]
    Empty,
    #[error("\"{0}\" is not a valid quantity.")]
    NotANumber(String),
    #[error("The quantity must be greater than zero.")]
    NotPositive,
    #[error("Only whole units of this product can be ordered.")]
    FractionNotAllowed,
    #[error("At most {allowed} decimal places are allowed.")]
    TooManyDecimals { allowed: u32 },
    #[error("At most {max} can be ordered.")]
    TooLarge { max: Decimal },
}

/// Parse a customer-entered quantity for a product sold in `unit`.
///
/// Accepts `,` as decimal separator. Trailing zeros do not count towards the
/// decimal places (`1.50` is fine for a one-decimal unit).
///
/// # Errors
///
/// Returns `QuantityError` if the input is empty, not a plain decimal, not
/// positive, too precise for the unit, or larger than `max`.
pub fn parse_quantity(
    raw: &str,
    unit: &QuantityUnit,
    max: Decimal,
) -> Result<Decimal, QuantityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::Empty);
    }

    let normalized = trimmed.replace(',', ".");
    let quantity = Decimal::from_str(&normalized)
        .map_err(|_| QuantityError::NotANumber(trimmed.to_owned()))?
        .normalize();

    if quantity <= Decimal::ZERO {
        return Err(QuantityError::NotPositive);
    }

    if quantity.scale() > unit.decimal_places {
        return Err(if unit.decimal_places == 0 {
            QuantityError::FractionNotAllowed
        } else {
            QuantityError::TooManyDecimals {
                allowed: unit.decimal_places,
            }
        });
    }

    if quantity > max {
        return Err(QuantityError::TooLarge { max });
    }

    Ok(quantity)
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
}

/// Session-held shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of a product in the cart, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Decimal {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(Decimal::ZERO, |l| l.quantity)
    }

    /// Add `quantity` to the product's line, creating it if needed.
    ///
    /// Returns the new line quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the line would exceed `max`; the
    /// cart is left unchanged.
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: Decimal,
        max: Decimal,
    ) -> Result<Decimal, QuantityError> {
        let total = (self.quantity_of(product_id) + quantity).normalize();
        if total > max {
            return Err(QuantityError::TooLarge { max });
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = total,
            None => self.lines.push(CartLine {
                product_id,
                quantity: total,
            }),
        }
        Ok(total)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::CurrencyCode;

    fn unit(decimal_places: u32) -> QuantityUnit {
        QuantityUnit {
            id: QuantityUnitId::new(1),
            title: "kg".to_string(),
            decimal_places,
        }
    }

    fn product() -> Product {
        Product {
            id: ProductId::new(11),
            title: "Coffee beans".to_string(),
            price: Price::from_cents(1299, CurrencyCode::USD),
            last_edited: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            quantity_unit: unit(0),
            is_active: true,
        }
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let p = product();
        assert_eq!(p.cache_key(Decimal::ONE), p.cache_key(Decimal::ONE));
        assert_eq!(p.cache_key(Decimal::ONE).len(), 64);
    }

    #[test]
    fn test_cache_key_changes_with_each_input() {
        let p = product();
        let base = p.cache_key(Decimal::ONE);

        let other_id = cache_key(ProductId::new(12), p.last_edited, Decimal::ONE);
        let edited = cache_key(p.id, p.last_edited + chrono::Duration::seconds(1), Decimal::ONE);
        let more_in_cart = p.cache_key(Decimal::TWO);

        assert_ne!(base, other_id);
        assert_ne!(base, edited);
        assert_ne!(base, more_in_cart);
    }

    #[test]
    fn test_cache_key_ignores_trailing_zeros() {
        let p = product();
        assert_eq!(p.cache_key(Decimal::new(200, 2)), p.cache_key(Decimal::TWO));
    }

    #[test]
    fn test_parse_whole_units() {
        let max = Decimal::from(999);
        assert_eq!(parse_quantity(" 3 ", &unit(0), max), Ok(Decimal::from(3)));
        assert_eq!(parse_quantity("3.0", &unit(0), max), Ok(Decimal::from(3)));
        assert_eq!(
            parse_quantity("1.5", &unit(0), max),
            Err(QuantityError::FractionNotAllowed)
        );
    }

    #[test]
    fn test_parse_fractional_units() {
        let max = Decimal::from(999);
        assert_eq!(parse_quantity("1,25", &unit(2), max), Ok(Decimal::new(125, 2)));
        assert_eq!(parse_quantity("1.50", &unit(1), max), Ok(Decimal::new(15, 1)));
        assert_eq!(
            parse_quantity("1.255", &unit(2), max),
            Err(QuantityError::TooManyDecimals { allowed: 2 })
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let max = Decimal::from(10);
        assert_eq!(parse_quantity("", &unit(0), max), Err(QuantityError::Empty));
        assert_eq!(
            parse_quantity("two", &unit(0), max),
            Err(QuantityError::NotANumber("two".to_string()))
        );
        assert_eq!(parse_quantity("0", &unit(0), max), Err(QuantityError::NotPositive));
        assert_eq!(parse_quantity("-1", &unit(0), max), Err(QuantityError::NotPositive));
        assert_eq!(
            parse_quantity("11", &unit(0), max),
            Err(QuantityError::TooLarge { max })
        );
    }

    #[test]
    fn test_cart_add_accumulates() {
        let mut cart = Cart::default();
        let max = Decimal::from(5);
        let id = ProductId::new(1);

        assert_eq!(cart.add(id, Decimal::TWO, max), Ok(Decimal::TWO));
        assert_eq!(cart.add(id, Decimal::ONE, max), Ok(Decimal::from(3)));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(2)), Decimal::ZERO);
    }

    #[test]
    fn test_cart_add_respects_line_maximum() {
        let mut cart = Cart::default();
        let max = Decimal::from(5);
        let id = ProductId::new(1);
        cart.add(id, Decimal::from(4), max).unwrap();

        assert_eq!(
            cart.add(id, Decimal::TWO, max),
            Err(QuantityError::TooLarge { max })
        );
        assert_eq!(cart.quantity_of(id), Decimal::from(4));
    }
}
