//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! quantity_units:
//!   - title: kg
//!     decimal_places: 3
//! products:
//!   - title: Basmati rice
//!     price: "4.20"
//!     unit: kg
//! zones:
//!   - title: Benelux
//!     countries: [BE, NL, LU]
//! carriers:
//!   - title: PostNL
//!     methods:
//!       - title: Standard
//!         fee: "6.95"
//!         zones: [Benelux]
//! ```

use std::path::Path;

use tracing::{error, info};

use pantry_storefront::db;
use pantry_storefront::db::seed::{CatalogSeed, seed_catalog, validate_seed};

use super::database_url;

/// Parse a seed file's contents.
///
/// # Errors
///
/// Returns the YAML error if the contents do not describe a catalog.
pub fn parse(content: &str) -> Result<CatalogSeed, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Seed the catalog from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML seed file
/// * `check_only` - If true, stop after validation
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid, the database
/// URL is missing, or inserting fails.
pub async fn catalog(
    file_path: &str,
    check_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed = parse(&content)?;

    info!(
        units = seed.quantity_units.len(),
        products = seed.products.len(),
        zones = seed.zones.len(),
        carriers = seed.carriers.len(),
        "Parsed seed file"
    );

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!("Seed validated successfully");
    if check_only {
        return Ok(());
    }

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let result = seed_catalog(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Quantity units: {}", result.quantity_units);
    info!("  Products: {}", result.products);
    info!("  Zones: {}", result.zones);
    info!("  Carriers: {}", result.carriers);
    info!("  Shipping methods: {}", result.shipping_methods);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r#"
quantity_units:
  - title: kg
    decimal_places: 3
  - title: piece
products:
  - title: Basmati rice
    price: "4.20"
    unit: kg
  - title: Tea tin
    price: "12"
    unit: piece
    active: false
zones:
  - title: Benelux
    countries: [BE, NL, LU]
carriers:
  - title: PostNL
    methods:
      - title: Standard
        fee: "6.95"
        zones: [Benelux]
      - title: Pickup
        fee: "0"
"#;

    #[test]
    fn test_parse_seed_file() {
        let seed = parse(SEED).unwrap();

        assert_eq!(seed.quantity_units.len(), 2);
        assert_eq!(seed.quantity_units[1].decimal_places, 0);
        assert!(seed.products[0].active);
        assert!(!seed.products[1].active);
        assert_eq!(seed.zones[0].countries, vec!["BE", "NL", "LU"]);

        let methods = &seed.carriers[0].methods;
        assert_eq!(methods.len(), 2);
        assert!(methods[1].zones.is_empty());
        assert!(validate_seed(&seed).is_empty());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed = parse("products: []").unwrap();
        assert!(seed.carriers.is_empty());
        assert!(seed.quantity_units.is_empty());
    }

    #[test]
    fn test_unknown_unit_fails_validation() {
        let seed = parse(
            r#"
products:
  - title: Rice
    price: "1"
    unit: sack
"#,
        )
        .unwrap();
        assert!(!validate_seed(&seed).is_empty());
    }
}
