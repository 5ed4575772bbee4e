//! Catalog seeding.
//!
//! A [`CatalogSeed`] describes quantity units, products, zones and carriers
//! with their shipping methods. Units and zones are referenced by title.
//! Everything is inserted in one transaction, so a failed seed leaves the
//! database untouched.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use pantry_core::CountryCode;

use super::RepositoryError;

/// Seed file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    pub quantity_units: Vec<UnitSeed>,
    pub products: Vec<ProductSeed>,
    pub zones: Vec<ZoneSeed>,
    pub carriers: Vec<CarrierSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitSeed {
    pub title: String,
    #[serde(default)]
    pub decimal_places: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    pub title: String,
    pub price: Decimal,
    /// Title of a unit in `quantity_units`.
    pub unit: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSeed {
    pub title: String,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarrierSeed {
    pub title: String,
    #[serde(default)]
    pub methods: Vec<MethodSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodSeed {
    pub title: String,
    pub fee: Decimal,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Titles of zones in `zones`.
    #[serde(default)]
    pub zones: Vec<String>,
}

const fn default_true() -> bool {
    true
}

/// Row counts written by [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub quantity_units: usize,
    pub products: usize,
    pub zones: usize,
    pub carriers: usize,
    pub shipping_methods: usize,
}

/// Check a seed for problems before touching the database.
///
/// Returns one message per problem; empty means valid.
#[must_use]
pub fn validate_seed(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    let mut units = Vec::new();
    for unit in &seed.quantity_units {
        if units.contains(&unit.title.as_str()) {
            errors.push(format!("Duplicate quantity unit: {}", unit.title));
        }
        units.push(unit.title.as_str());
        if unit.decimal_places < 0 {
            errors.push(format!(
                "Quantity unit '{}' has negative decimal places",
                unit.title
            ));
        }
    }

    for product in &seed.products {
        if product.title.trim().is_empty() {
            errors.push("Product with empty title".to_string());
        }
        if product.price < Decimal::ZERO {
            errors.push(format!("Product '{}' has a negative price", product.title));
        }
        if !units.contains(&product.unit.as_str()) {
            errors.push(format!(
                "Product '{}' uses unknown unit '{}'",
                product.title, product.unit
            ));
        }
    }

    let mut zones = Vec::new();
    for zone in &seed.zones {
        if zones.contains(&zone.title.as_str()) {
            errors.push(format!("Duplicate zone: {}", zone.title));
        }
        zones.push(zone.title.as_str());
        let mut countries = Vec::new();
        for code in &zone.countries {
            match CountryCode::parse(code) {
                Ok(country) if countries.contains(&country) => {
                    errors.push(format!(
                        "Zone '{}' lists country '{country}' twice",
                        zone.title
                    ));
                }
                Ok(country) => countries.push(country),
                Err(e) => {
                    errors.push(format!("Zone '{}': country '{code}': {e}", zone.title));
                }
            }
        }
    }

    for carrier in &seed.carriers {
        for method in &carrier.methods {
            if method.fee < Decimal::ZERO {
                errors.push(format!(
                    "Shipping method '{}' has a negative fee",
                    method.title
                ));
            }
            for zone in &method.zones {
                if !zones.contains(&zone.as_str()) {
                    errors.push(format!(
                        "Shipping method '{}' uses unknown zone '{zone}'",
                        method.title
                    ));
                }
            }
        }
    }

    errors
}

/// Insert a validated seed in a single transaction.
///
/// Call [`validate_seed`] first; unknown references found here surface as
/// `RepositoryError::NotFound`.
///
/// # Errors
///
/// Returns `RepositoryError` if a reference is unknown or a query fails.
#[instrument(skip(pool, seed), fields(products = seed.products.len(), carriers = seed.carriers.len()))]
pub async fn seed_catalog(
    pool: &PgPool,
    seed: &CatalogSeed,
) -> Result<SeedResult, RepositoryError> {
    let mut tx = pool.begin().await?;
    let mut result = SeedResult::default();

    let mut unit_ids: HashMap<&str, i32> = HashMap::new();
    for unit in &seed.quantity_units {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO quantity_units (title, decimal_places) VALUES ($1, $2) RETURNING id",
        )
        .bind(&unit.title)
        .bind(unit.decimal_places)
        .fetch_one(&mut *tx)
        .await?;
        unit_ids.insert(unit.title.as_str(), id);
        result.quantity_units += 1;
    }

    for product in &seed.products {
        let unit_id = unit_ids
            .get(product.unit.as_str())
            .copied()
            .ok_or_else(|| RepositoryError::NotFound(format!("quantity unit {}", product.unit)))?;
        sqlx::query(
            "INSERT INTO products (title, price, quantity_unit_id, is_active) VALUES ($1, $2, $3, $4)",
        )
        .bind(&product.title)
        .bind(product.price)
        .bind(unit_id)
        .bind(product.active)
        .execute(&mut *tx)
        .await?;
        result.products += 1;
    }

    let mut zone_ids: HashMap<&str, i32> = HashMap::new();
    for zone in &seed.zones {
        let id: i32 = sqlx::query_scalar("INSERT INTO zones (title) VALUES ($1) RETURNING id")
            .bind(&zone.title)
            .fetch_one(&mut *tx)
            .await?;
        for code in &zone.countries {
            let country = CountryCode::parse(code).map_err(|e| {
                RepositoryError::DataCorruption(format!("zone {}: {e}", zone.title))
            })?;
            sqlx::query("INSERT INTO zone_countries (zone_id, country_code) VALUES ($1, $2)")
                .bind(id)
                .bind(&country)
                .execute(&mut *tx)
                .await?;
        }
        zone_ids.insert(zone.title.as_str(), id);
        result.zones += 1;
    }

    for carrier in &seed.carriers {
        let carrier_id: i32 =
            sqlx::query_scalar("INSERT INTO carriers (title) VALUES ($1) RETURNING id")
                .bind(&carrier.title)
                .fetch_one(&mut *tx)
                .await?;
        result.carriers += 1;

        for method in &carrier.methods {
            let method_id: i32 = sqlx::query_scalar(
                r"
                INSERT INTO shipping_methods (title, carrier_id, fee, is_active)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                ",
            )
            .bind(&method.title)
            .bind(carrier_id)
            .bind(method.fee)
            .bind(method.active)
            .fetch_one(&mut *tx)
            .await?;

            for zone in &method.zones {
                let zone_id = zone_ids
                    .get(zone.as_str())
                    .copied()
                    .ok_or_else(|| RepositoryError::NotFound(format!("zone {zone}")))?;
                sqlx::query(
                    "INSERT INTO shipping_method_zones (shipping_method_id, zone_id) VALUES ($1, $2)",
                )
                .bind(method_id)
                .bind(zone_id)
                .execute(&mut *tx)
                .await?;
            }
            result.shipping_methods += 1;
        }
    }

    tx.commit().await?;
    info!(?result, "catalog seeded");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> CatalogSeed {
        CatalogSeed {
            quantity_units: vec![UnitSeed {
                title: "kg".to_string(),
                decimal_places: 2,
            }],
            products: vec![ProductSeed {
                title: "Flour".to_string(),
                price: Decimal::new(349, 2),
                unit: "kg".to_string(),
                active: true,
            }],
            zones: vec![ZoneSeed {
                title: "EU".to_string(),
                countries: vec!["DE".to_string(), "fr".to_string()],
            }],
            carriers: vec![CarrierSeed {
                title: "Parcelco".to_string(),
                methods: vec![MethodSeed {
                    title: "Standard".to_string(),
                    fee: Decimal::new(495, 2),
                    active: true,
                    zones: vec!["EU".to_string()],
                }],
            }],
        }
    }

    #[test]
    fn test_valid_seed_has_no_errors() {
        assert!(validate_seed(&seed()).is_empty());
    }

    #[test]
    fn test_unknown_references_are_reported() {
        let mut seed = seed();
        seed.products[0].unit = "litre".to_string();
        seed.carriers[0].methods[0].zones.push("Mars".to_string());

        let errors = validate_seed(&seed);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("unknown unit 'litre'"));
        assert!(errors[1].contains("unknown zone 'Mars'"));
    }

    #[test]
    fn test_bad_values_are_reported() {
        let mut seed = seed();
        seed.quantity_units[0].decimal_places = -1;
        seed.zones[0].countries.push("Germany".to_string());
        seed.carriers[0].methods[0].fee = Decimal::new(-1, 0);

        assert_eq!(validate_seed(&seed).len(), 3);
    }

    #[test]
    fn test_duplicate_countries_in_a_zone_are_reported() {
        let mut seed = seed();
        seed.zones[0].countries = vec!["DE".to_string(), " de ".to_string(), "FR".to_string()];

        let errors = validate_seed(&seed);
        assert_eq!(errors, vec!["Zone 'EU' lists country 'DE' twice".to_string()]);

        seed.zones.push(ZoneSeed {
            title: "DACH".to_string(),
            countries: vec!["de".to_string(), "AT".to_string()],
        });
        seed.zones[0].countries = vec!["DE".to_string()];
        assert!(validate_seed(&seed).is_empty());
    }
}
