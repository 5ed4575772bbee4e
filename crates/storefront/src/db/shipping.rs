//! Shipping method repository.
//!
//! Loads the whole shipping catalog (methods, carriers, zones and zone
//! countries) in two queries. Eligibility is decided in memory by
//! [`pantry_core::shipping`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use pantry_core::shipping::{Carrier, ShippingCatalog, ShippingMethod, Zone};
use pantry_core::{CarrierId, CountryCode, CurrencyCode, Price, ShippingMethodId, ZoneId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct MethodRow {
    id: i32,
    title: String,
    fee: Decimal,
    is_active: bool,
    carrier_id: i32,
    carrier_title: String,
}

#[derive(Debug, sqlx::FromRow)]
struct MethodZoneRow {
    shipping_method_id: i32,
    zone_id: i32,
    zone_title: String,
    country_code: Option<String>,
}

/// Repository for shipping methods and their zones.
pub struct ShippingRepository<'a> {
    pool: &'a PgPool,
    currency: CurrencyCode,
}

impl<'a> ShippingRepository<'a> {
    /// Create a new shipping repository pricing fees in `currency`.
    #[must_use]
    pub const fn new(pool: &'a PgPool, currency: CurrencyCode) -> Self {
        Self { pool, currency }
    }

    /// Load every shipping method, active or not, with carrier and zones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` for an invalid country code.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<ShippingCatalog, RepositoryError> {
        let methods = sqlx::query_as::<_, MethodRow>(
            r"
            SELECT m.id, m.title, m.fee, m.is_active,
                   c.id AS carrier_id, c.title AS carrier_title
            FROM shipping_methods m
            JOIN carriers c ON c.id = m.carrier_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let zone_rows = sqlx::query_as::<_, MethodZoneRow>(
            r"
            SELECT mz.shipping_method_id, z.id AS zone_id, z.title AS zone_title,
                   zc.country_code
            FROM shipping_method_zones mz
            JOIN zones z ON z.id = mz.zone_id
            LEFT JOIN zone_countries zc ON zc.zone_id = z.id
            ORDER BY mz.shipping_method_id, z.id, zc.country_code
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let mut zones = group_zones(zone_rows)?;

        let methods = methods
            .into_iter()
            .map(|row| ShippingMethod {
                id: ShippingMethodId::new(row.id),
                title: row.title,
                carrier: Carrier {
                    id: CarrierId::new(row.carrier_id),
                    title: row.carrier_title,
                },
                fee: Price::new(row.fee, self.currency),
                is_active: row.is_active,
                zones: zones.remove(&row.id).unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = methods.len(), "loaded shipping catalog");
        Ok(ShippingCatalog::new(methods))
    }
}

/// Fold joined zone rows into zones per shipping method id.
fn group_zones(rows: Vec<MethodZoneRow>) -> Result<BTreeMap<i32, Vec<Zone>>, RepositoryError> {
    let mut grouped: BTreeMap<i32, Vec<Zone>> = BTreeMap::new();

    for row in rows {
        let zones = grouped.entry(row.shipping_method_id).or_default();
        let zone_id = ZoneId::new(row.zone_id);

        let index = if let Some(i) = zones.iter().position(|z| z.id == zone_id) {
            i
        } else {
            zones.push(Zone {
                id: zone_id,
                title: row.zone_title,
                countries: Vec::new(),
            });
            zones.len() - 1
        };

        if let Some(code) = row.country_code {
            let country = CountryCode::parse(&code).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "zone {} has invalid country '{code}': {e}",
                    row.zone_id
                ))
            })?;
            if let Some(zone) = zones.get_mut(index) {
                zone.countries.push(country);
            }
        }
    }

    Ok(grouped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(method: i32, zone: i32, country: Option<&str>) -> MethodZoneRow {
        MethodZoneRow {
            shipping_method_id: method,
            zone_id: zone,
            zone_title: format!("zone {zone}"),
            country_code: country.map(str::to_string),
        }
    }

    #[test]
    fn test_group_zones_collects_countries() {
        let grouped = group_zones(vec![
            row(1, 10, Some("DE")),
            row(1, 10, Some("FR")),
            row(1, 11, None),
            row(2, 10, Some("DE")),
        ])
        .unwrap();

        let first = grouped.get(&1).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].countries.len(), 2);
        assert!(first[1].countries.is_empty());
        assert_eq!(grouped.get(&2).unwrap()[0].countries[0].as_str(), "DE");
    }

    #[test]
    fn test_group_zones_rejects_bad_country() {
        let result = group_zones(vec![row(1, 10, Some("Germany"))]);
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }
}
