//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use pantry_core::cart::{Product, QuantityUnit};
use pantry_core::{CurrencyCode, Price, ProductId, QuantityUnitId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    price: Decimal,
    last_edited: DateTime<Utc>,
    is_active: bool,
    unit_id: i32,
    unit_title: String,
    decimal_places: i32,
}

impl ProductRow {
    fn into_product(self, currency: CurrencyCode) -> Result<Product, RepositoryError> {
        let decimal_places = u32::try_from(self.decimal_places).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "quantity unit {} has negative decimal places",
                self.unit_id
            ))
        })?;

        Ok(Product {
            id: ProductId::new(self.id),
            title: self.title,
            price: Price::new(self.price, currency),
            last_edited: self.last_edited,
            quantity_unit: QuantityUnit {
                id: QuantityUnitId::new(self.unit_id),
                title: self.unit_title,
                decimal_places,
            },
            is_active: self.is_active,
        })
    }
}

/// Repository for product lookups.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
    currency: CurrencyCode,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository pricing in `currency`.
    #[must_use]
    pub const fn new(pool: &'a PgPool, currency: CurrencyCode) -> Self {
        Self { pool, currency }
    }

    /// Get an active product with its quantity unit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the unit is malformed.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.title, p.price, p.last_edited, p.is_active,
                   u.id AS unit_id, u.title AS unit_title, u.decimal_places
            FROM products p
            JOIN quantity_units u ON u.id = p.quantity_unit_id
            WHERE p.id = $1 AND p.is_active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_product(self.currency)).transpose()
    }
}
