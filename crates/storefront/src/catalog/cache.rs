//! Cache types for catalog lookups and rendered fragments.

use std::sync::Arc;

use pantry_core::ProductId;
use pantry_core::cart::Product;
use pantry_core::shipping::ShippingCatalog;

/// Cache key for catalog data.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Shipping,
    /// Rendered add-to-cart control, keyed by its content hash.
    AddToCart(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Shipping(Arc<ShippingCatalog>),
    Fragment(Arc<str>),
}
