//! Database operations for the storefront `PostgreSQL` catalog.
//!
//! # Database: `pantry_storefront`
//!
//! ## Tables
//!
//! - `quantity_units` - Units products are sold in, with allowed decimal places
//! - `products` - Sellable items
//! - `carriers` - Parcel carriers
//! - `zones` / `zone_countries` - Named sets of destination countries
//! - `shipping_methods` / `shipping_method_zones` - Carrier fee options and where they ship
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/`, embedded as
//! [`MIGRATOR`] and run via:
//! ```bash
//! cargo run -p pantry-cli -- migrate
//! ```

pub mod products;
pub mod seed;
pub mod shipping;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use products::ProductRepository;
pub use shipping::ShippingRepository;

/// Catalog schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
