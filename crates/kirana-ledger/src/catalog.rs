//! # Catalog Service
//!
//! Product entry and upkeep. Catalog edits never assign `stock`; stock only
//! moves through sales, purchases, imports and explicit adjustments.

use tracing::{debug, info};

use crate::error::LedgerResult;
use crate::Ledger;
use kirana_core::validation::{validate_new_product, validate_price, validate_product_name};
use kirana_core::{
    ChangeSet, Collection, CoreError, NewProduct, Product, ProductUpdate, ValidationError,
    DEFAULT_UNIT,
};

/// Catalog operations bound to a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    ledger: &'a Ledger,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        Catalog { ledger }
    }

    /// Adds a product with a fresh id.
    ///
    /// ## Errors
    /// - `Validation` for a blank name, negative prices or negative stock
    /// - `Validation(Duplicate)` when another product has the same name
    ///   (names are the natural key for imports)
    pub async fn add_product(&self, input: NewProduct) -> LedgerResult<Product> {
        validate_new_product(&input)?;

        let _guard = self.ledger.lock_writes().await;
        let mut products = self.load().await?;
        ensure_unique_name(&products, &input.name, None)?;

        let product = Product {
            id: self.ledger.new_id(),
            name: input.name.trim().to_string(),
            category: input.category.trim().to_string(),
            unit: input
                .unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            purchase_price: input.purchase_price,
            sales_price: input.sales_price,
            stock: input.initial_stock,
        };
        products.push(product.clone());

        self.ledger
            .commit(ChangeSet::new().with_products(products))
            .await?;

        info!(product_id = %product.id, name = %product.name, stock = product.stock, "Product added");
        Ok(product)
    }

    /// Edits name, category, unit or prices.
    pub async fn update_product(&self, product_id: &str, update: ProductUpdate) -> LedgerResult<Product> {
        if let Some(name) = &update.name {
            validate_product_name(name)?;
        }
        if let Some(price) = update.purchase_price {
            validate_price("purchase_price", price)?;
        }
        if let Some(price) = update.sales_price {
            validate_price("sales_price", price)?;
        }

        let _guard = self.ledger.lock_writes().await;
        let mut products = self.load().await?;

        if let Some(name) = &update.name {
            ensure_unique_name(&products, name, Some(product_id))?;
        }

        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if let Some(name) = update.name {
            product.name = name.trim().to_string();
        }
        if let Some(category) = update.category {
            product.category = category.trim().to_string();
        }
        if let Some(unit) = update.unit.filter(|u| !u.trim().is_empty()) {
            product.unit = unit.trim().to_string();
        }
        if let Some(price) = update.purchase_price {
            product.purchase_price = price;
        }
        if let Some(price) = update.sales_price {
            product.sales_price = price;
        }
        let updated = product.clone();

        self.ledger
            .commit(ChangeSet::new().with_products(products))
            .await?;

        debug!(product_id = %updated.id, "Product updated");
        Ok(updated)
    }

    /// Removes a product from the catalog. Historic sales and purchases keep
    /// their own item snapshots.
    pub async fn delete_product(&self, product_id: &str) -> LedgerResult<Product> {
        let _guard = self.ledger.lock_writes().await;
        let mut products = self.load().await?;

        let index = products
            .iter()
            .position(|p| p.id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        let removed = products.remove(index);

        self.ledger
            .commit(ChangeSet::new().with_products(products))
            .await?;

        info!(product_id = %removed.id, name = %removed.name, "Product deleted");
        Ok(removed)
    }

    pub async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        self.load().await
    }

    pub async fn get_product(&self, product_id: &str) -> LedgerResult<Product> {
        self.load()
            .await?
            .into_iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    /// Products at or below `threshold`, lowest stock first. Negative stock
    /// is included.
    pub async fn low_stock(&self, threshold: i64) -> LedgerResult<Vec<Product>> {
        let mut low: Vec<Product> = self
            .load()
            .await?
            .into_iter()
            .filter(|p| p.stock <= threshold)
            .collect();
        low.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
        Ok(low)
    }

    async fn load(&self) -> LedgerResult<Vec<Product>> {
        Ok(self
            .ledger
            .database()
            .documents()
            .get(Collection::Products)
            .await?)
    }
}

fn ensure_unique_name(products: &[Product], name: &str, except_id: Option<&str>) -> LedgerResult<()> {
    let clash = products
        .iter()
        .any(|p| p.name_matches(name) && Some(p.id.as_str()) != except_id);

    if clash {
        return Err(ValidationError::Duplicate {
            field: "name".to_string(),
            value: name.trim().to_string(),
        }
        .into());
    }
    Ok(())
}
