//! # Purchase Transactions
//!
//! Commits supplier purchases: stock goes up, cost basis follows the latest
//! purchase price. Purchases are append-only; there is no reversal.
//!
//! ```text
//! PurchaseRequest ──► validate ──► name snapshot ──► adjust(+qty)
//!                                                  └─► purchase_price = latest
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::stock::{self, StockDelta};
use crate::types::{Product, Purchase, PurchaseItem};

/// One line of a purchase as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub product_id: String,
    pub quantity: i64,
    pub purchase_price: Money,
}

/// A purchase as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub supplier: String,
    pub date: NaiveDate,
    pub items: Vec<PurchaseLine>,
    #[serde(default)]
    pub notes: String,
}

/// Commits a purchase.
///
/// ## Errors
/// - `InvalidPurchase` for no items, a non-positive quantity or a
///   non-positive price
/// - `ProductNotFound` when a line references an unknown product
///
/// On error neither collection has changed.
pub fn commit_purchase(
    products: &mut [Product],
    purchases: &mut Vec<Purchase>,
    request: PurchaseRequest,
    id: String,
) -> CoreResult<Purchase> {
    if request.items.is_empty() {
        return Err(CoreError::invalid_purchase("at least one item is required"));
    }

    let mut items = Vec::with_capacity(request.items.len());
    for line in &request.items {
        if line.quantity <= 0 {
            return Err(CoreError::invalid_purchase(format!(
                "quantity must be positive for product {}",
                line.product_id
            )));
        }
        if !line.purchase_price.is_positive() {
            return Err(CoreError::invalid_purchase(format!(
                "purchase price must be positive for product {}",
                line.product_id
            )));
        }
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        items.push(PurchaseItem {
            product_id: line.product_id.clone(),
            product_name: product.name.clone(),
            quantity: line.quantity,
            purchase_price: line.purchase_price,
        });
    }

    let deltas: Vec<StockDelta> = items
        .iter()
        .map(|item| StockDelta::new(item.product_id.clone(), item.quantity))
        .collect();
    stock::apply(products, &deltas)?;

    // Last purchase price wins
    for item in &items {
        if let Some(product) = products.iter_mut().find(|p| p.id == item.product_id) {
            product.purchase_price = item.purchase_price;
        }
    }

    let purchase = Purchase {
        id,
        date: request.date,
        supplier: request.supplier.trim().to_string(),
        total_amount: items.iter().map(PurchaseItem::line_total).sum(),
        items,
        notes: request.notes,
    };

    purchases.push(purchase.clone());
    Ok(purchase)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            Product {
                id: "sugar".to_string(),
                name: "Sugar".to_string(),
                category: "Staples".to_string(),
                unit: "kg".to_string(),
                purchase_price: Money::from_major(38),
                sales_price: Money::from_major(45),
                stock: 20,
            },
            Product {
                id: "tea".to_string(),
                name: "Tea 250g".to_string(),
                category: "Beverages".to_string(),
                unit: "pcs".to_string(),
                purchase_price: Money::from_major(110),
                sales_price: Money::from_major(140),
                stock: 6,
            },
        ]
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn line(id: &str, quantity: i64, price: i64) -> PurchaseLine {
        PurchaseLine {
            product_id: id.to_string(),
            quantity,
            purchase_price: Money::from_major(price),
        }
    }

    fn request(items: Vec<PurchaseLine>) -> PurchaseRequest {
        PurchaseRequest {
            supplier: "Agarwal Traders".to_string(),
            date: date(),
            items,
            notes: String::new(),
        }
    }

    #[test]
    fn test_commit_purchase_updates_stock_and_cost() {
        let mut products = catalog();
        let mut purchases = Vec::new();

        let purchase = commit_purchase(
            &mut products,
            &mut purchases,
            request(vec![line("sugar", 50, 40), line("tea", 12, 105)]),
            "pu-1".to_string(),
        )
        .unwrap();

        assert_eq!(purchase.total_amount, Money::from_major(50 * 40 + 12 * 105));
        assert_eq!(purchase.items[0].product_name, "Sugar");
        assert_eq!(products[0].stock, 70);
        assert_eq!(products[0].purchase_price, Money::from_major(40));
        assert_eq!(products[1].stock, 18);
        assert_eq!(products[1].purchase_price, Money::from_major(105));
        // Shelf price is not touched
        assert_eq!(products[0].sales_price, Money::from_major(45));
        assert_eq!(purchases.len(), 1);
    }

    #[test]
    fn test_last_purchase_price_wins() {
        let mut products = catalog();
        let mut purchases = Vec::new();

        commit_purchase(
            &mut products,
            &mut purchases,
            request(vec![line("sugar", 10, 36), line("sugar", 5, 41)]),
            "pu-1".to_string(),
        )
        .unwrap();

        assert_eq!(products[0].purchase_price, Money::from_major(41));
        assert_eq!(products[0].stock, 35);
    }

    #[test]
    fn test_invalid_purchases_rejected() {
        let mut products = catalog();
        let mut purchases = Vec::new();

        for items in [
            vec![],
            vec![line("sugar", 0, 40)],
            vec![line("sugar", 5, 0)],
            vec![line("sugar", -1, 40)],
        ] {
            let err = commit_purchase(&mut products, &mut purchases, request(items), "x".into())
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidPurchase { .. }));
        }

        assert!(purchases.is_empty());
        assert_eq!(products[0].stock, 20);
    }

    #[test]
    fn test_unknown_product_leaves_stock_untouched() {
        let mut products = catalog();
        let mut purchases = Vec::new();

        let err = commit_purchase(
            &mut products,
            &mut purchases,
            request(vec![line("sugar", 5, 40), line("ghee", 2, 500)]),
            "pu-1".to_string(),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghee"));
        assert_eq!(products[0].stock, 20);
        assert_eq!(products[0].purchase_price, Money::from_major(38));
        assert!(purchases.is_empty());
    }
}
