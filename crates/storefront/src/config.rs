//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CURRENCY` - Shop currency (default: USD)
//! - `STOREFRONT_PAYMENT_METHODS` - Comma-separated payment choices (default: invoice,prepayment)
//! - `STOREFRONT_STALE_ANSWERS` - `retain` or `discard` answers of reset steps (default: retain)
//! - `STOREFRONT_MAX_LINE_QUANTITY` - Largest quantity per cart line (default: 999)
//! - `STOREFRONT_DEFAULT_COUNTRY` - Country pre-filled in the address step
//! - `STOREFRONT_CATALOG_TTL_SECS` - Catalog cache lifetime in seconds (default: 300)
//! - `STOREFRONT_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use pantry_core::{CountryCode, CurrencyCode};
use pantry_core::checkout::StaleAnswerPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Checkout behaviour
    pub checkout: CheckoutConfig,
    /// How long catalog lookups stay cached
    pub catalog_ttl: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. `production`)
    pub sentry_environment: Option<String>,
}

/// Checkout and cart settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Currency prices are shown in.
    pub currency: CurrencyCode,
    /// Choices offered in the payment step.
    pub payment_methods: Vec<String>,
    /// What happens to answers of steps reset by an earlier change.
    pub stale_answers: StaleAnswerPolicy,
    /// Largest quantity a single cart line may hold.
    pub max_line_quantity: Decimal,
    /// Country pre-filled in the address form.
    pub default_country: Option<CountryCode>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::USD,
            payment_methods: vec!["invoice".to_string(), "prepayment".to_string()],
            stale_answers: StaleAnswerPolicy::Retain,
            max_line_quantity: Decimal::from(999),
            default_country: None,
        }
    }
}

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or_default("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("STOREFRONT_PORT", "3000")?;
        let base_url = Url::parse(&get_required_env("STOREFRONT_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let checkout = CheckoutConfig::from_env()?;
        let catalog_ttl = Duration::from_secs(parse_env_or_default(
            "STOREFRONT_CATALOG_TTL_SECS",
            "300",
        )?);
        let log_format = parse_env_or_default("STOREFRONT_LOG_FORMAT", "pretty")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            checkout,
            catalog_ttl,
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let payment_methods = get_optional_env("STOREFRONT_PAYMENT_METHODS")
            .map_or(defaults.payment_methods, |raw| parse_list(&raw));
        if payment_methods.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_PAYMENT_METHODS".to_string(),
                "at least one payment method is required".to_string(),
            ));
        }

        let default_country = get_optional_env("STOREFRONT_DEFAULT_COUNTRY")
            .map(|raw| {
                CountryCode::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("STOREFRONT_DEFAULT_COUNTRY".to_string(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            currency: parse_env_or_default("STOREFRONT_CURRENCY", "USD")?,
            payment_methods,
            stale_answers: parse_env_or_default("STOREFRONT_STALE_ANSWERS", "retain")?,
            max_line_quantity: parse_env_or_default("STOREFRONT_MAX_LINE_QUANTITY", "999")?,
            default_country,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_optional_env(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated list, dropping blanks and duplicates.
fn parse_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}
