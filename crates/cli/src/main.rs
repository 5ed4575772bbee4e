//! Pantry CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog and session store migrations
//! pantry-cli migrate
//!
//! # Check a catalog seed file without writing anything
//! pantry-cli seed catalog seeds/catalog.yaml --check
//!
//! # Seed the catalog
//! pantry-cli seed catalog seeds/catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pantry-cli")]
#[command(author, version, about = "Pantry CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed units, products, zones, carriers and shipping methods
    Catalog {
        /// Path to the YAML seed file
        file: String,

        /// Only parse and validate the file
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file, check } => commands::seed::catalog(&file, check).await?,
        },
    }
    Ok(())
}
