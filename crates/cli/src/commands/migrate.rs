//! Database migration command.
//!
//! Runs the catalog migrations embedded in `pantry-storefront`, then creates
//! the tower-sessions table used by the session store.
//!
//! # Usage
//!
//! ```bash
//! pantry-cli migrate
//! ```

use tower_sessions_sqlx_store::PostgresStore;

use pantry_storefront::db;

use super::{CommandError, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run catalog and session store migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!(
        migrations = db::MIGRATOR.iter().count(),
        "Running catalog migrations..."
    );
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Running session store migrations...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
