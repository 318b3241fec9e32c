//! # Inventory Stock Tracker
//!
//! The one place product stock is changed.
//!
//! ```text
//! sale commit      ──► adjust(product, -qty)
//! sale reversal    ──► adjust(product, +qty)
//! purchase commit  ──► adjust(product, +quantity)
//! product import   ──► adjust(product, +imported)
//! ```
//!
//! The tracker does not enforce `stock >= 0`. Checkout pre-checks live stock
//! before decrementing; anything that slips past that shows up as negative
//! stock ("out of stock") rather than an error.

use crate::error::{CoreError, CoreResult};
use crate::types::Product;

/// A signed stock change for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,
    pub delta: i64,
}

impl StockDelta {
    pub fn new(product_id: impl Into<String>, delta: i64) -> Self {
        StockDelta {
            product_id: product_id.into(),
            delta,
        }
    }
}

/// Applies `stock += delta` to the named product and returns the new stock.
pub fn adjust(products: &mut [Product], product_id: &str, delta: i64) -> CoreResult<i64> {
    let product = products
        .iter_mut()
        .find(|p| p.id == product_id)
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    product.stock += delta;
    Ok(product.stock)
}

/// Applies a batch of deltas all-or-nothing.
///
/// Every product id is resolved first; if any is missing nothing is changed.
pub fn apply(products: &mut [Product], deltas: &[StockDelta]) -> CoreResult<()> {
    if let Some(missing) = deltas
        .iter()
        .find(|d| !products.iter().any(|p| p.id == d.product_id))
    {
        return Err(CoreError::ProductNotFound(missing.product_id.clone()));
    }

    for delta in deltas {
        adjust(products, &delta.product_id, delta.delta)?;
    }
    Ok(())
}

/// Current stock of a product, if it is still in the catalog.
pub fn current(products: &[Product], product_id: &str) -> Option<i64> {
    products
        .iter()
        .find(|p| p.id == product_id)
        .map(|p| p.stock)
}

// =============================================================================
// Unit Tests
// =============================================================================
