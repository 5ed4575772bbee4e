//! Product and shipping catalog with in-memory caching.
//!
//! Reads go through a `moka` cache (default 5-minute TTL) in front of the
//! Postgres repositories. Tests and local demos can use a fixed in-memory
//! catalog instead of a database.

mod cache;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use pantry_core::cart::Product;
use pantry_core::shipping::ShippingCatalog;
use pantry_core::{CurrencyCode, ProductId};

use crate::db::{ProductRepository, RepositoryError, ShippingRepository};

use cache::{CacheKey, CacheValue};

/// Maximum number of cached entries (products, fragments and the shipping
/// catalog together).
const CACHE_CAPACITY: u64 = 10_000;

/// Catalog access shared by all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    source: CatalogSource,
    cache: Cache<CacheKey, CacheValue>,
}

enum CatalogSource {
    Postgres {
        pool: PgPool,
        currency: CurrencyCode,
    },
    Fixed {
        products: HashMap<ProductId, Product>,
        shipping: Arc<ShippingCatalog>,
    },
}

impl Catalog {
    /// Catalog backed by Postgres, cached for `ttl`.
    #[must_use]
    pub fn postgres(pool: PgPool, currency: CurrencyCode, ttl: Duration) -> Self {
        Self::with_source(CatalogSource::Postgres { pool, currency }, ttl)
    }

    /// Catalog serving a fixed set of products and shipping methods.
    ///
    /// Rendered fragments are still cached for `ttl`.
    #[must_use]
    pub fn fixed(products: Vec<Product>, shipping: ShippingCatalog, ttl: Duration) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self::with_source(
            CatalogSource::Fixed {
                products,
                shipping: Arc::new(shipping),
            },
            ttl,
        )
    }

    fn with_source(source: CatalogSource, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogInner { source, cache }),
        }
    }

    /// Get an active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database lookup fails.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let (pool, currency) = match &self.inner.source {
            CatalogSource::Fixed { products, .. } => {
                return Ok(products.get(&id).filter(|p| p.is_active).cloned());
            }
            CatalogSource::Postgres { pool, currency } => (pool, *currency),
        };

        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product = ProductRepository::new(pool, currency).get_by_id(id).await?;

        if let Some(product) = &product {
            self.inner
                .cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(product)
    }

    /// Get the shipping catalog (all methods, active or not).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database lookup fails.
    #[instrument(skip(self))]
    pub async fn shipping(&self) -> Result<Arc<ShippingCatalog>, RepositoryError> {
        let (pool, currency) = match &self.inner.source {
            CatalogSource::Fixed { shipping, .. } => return Ok(Arc::clone(shipping)),
            CatalogSource::Postgres { pool, currency } => (pool, *currency),
        };

        if let Some(CacheValue::Shipping(shipping)) = self.inner.cache.get(&CacheKey::Shipping).await
        {
            debug!("Cache hit for shipping catalog");
            return Ok(shipping);
        }

        let shipping = Arc::new(ShippingRepository::new(pool, currency).load_catalog().await?);

        self.inner
            .cache
            .insert(CacheKey::Shipping, CacheValue::Shipping(Arc::clone(&shipping)))
            .await;

        Ok(shipping)
    }

    /// A previously rendered add-to-cart control.
    pub async fn cached_fragment(&self, key: &str) -> Option<Arc<str>> {
        match self
            .inner
            .cache
            .get(&CacheKey::AddToCart(key.to_owned()))
            .await
        {
            Some(CacheValue::Fragment(html)) => Some(html),
            _ => None,
        }
    }

    /// Remember a rendered add-to-cart control under its content hash.
    pub async fn store_fragment(&self, key: String, html: Arc<str>) {
        self.inner
            .cache
            .insert(CacheKey::AddToCart(key), CacheValue::Fragment(html))
            .await;
    }

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if Postgres does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let CatalogSource::Postgres { pool, .. } = &self.inner.source {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use pantry_core::cart::QuantityUnit;
    use pantry_core::{Price, QuantityUnitId};

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn product(id: i32, active: bool) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::from_cents(250, CurrencyCode::USD),
            last_edited: Utc::now(),
            quantity_unit: QuantityUnit {
                id: QuantityUnitId::new(1),
                title: "piece".to_string(),
                decimal_places: 0,
            },
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_fixed_catalog_hides_inactive_products() {
        let catalog = Catalog::fixed(
            vec![product(1, true), product(2, false)],
            ShippingCatalog::default(),
            TTL,
        );

        assert!(catalog.product(ProductId::new(1)).await.unwrap().is_some());
        assert!(catalog.product(ProductId::new(2)).await.unwrap().is_none());
        assert!(catalog.product(ProductId::new(3)).await.unwrap().is_none());
        assert!(catalog.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_fragments_round_trip() {
        let catalog = Catalog::fixed(Vec::new(), ShippingCatalog::default(), TTL);
        assert!(catalog.cached_fragment("abc").await.is_none());

        catalog.store_fragment("abc".to_string(), Arc::from("<form></form>")).await;
        assert_eq!(
            catalog.cached_fragment("abc").await.as_deref(),
            Some("<form></form>")
        );
        assert!(catalog.cached_fragment("abd").await.is_none());
    }

    #[tokio::test]
    async fn test_fragments_expire_after_ttl() {
        let catalog = Catalog::fixed(
            Vec::new(),
            ShippingCatalog::default(),
            Duration::from_millis(50),
        );
        catalog.store_fragment("abc".to_string(), Arc::from("<form></form>")).await;
        assert!(catalog.cached_fragment("abc").await.is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(catalog.cached_fragment("abc").await.is_none());
    }
}
