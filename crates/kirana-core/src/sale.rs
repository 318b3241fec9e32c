//! # Sale Transactions
//!
//! Checkout and reversal of sales against the in-memory catalog.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         commit_sale()                                   │
//! │                                                                         │
//! │  1. Cart not empty, every qty > 0                      ─┐               │
//! │  2. Requested qty per product ≤ LIVE catalog stock      │ nothing has   │
//! │     (not the stock captured on the cart line)           │ changed yet   │
//! │  3. Totals: subtotal, tax, total                       ─┘               │
//! │  4. Bill number: preserved (edit) or counter + 1                        │
//! │  5. Stock tracker: adjust(product, -qty) per line                       │
//! │  6. Append sale, ratchet counter                                        │
//! │                                                                         │
//! │  Any failure in 1-2 returns Err with every collection untouched.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edit Flow
//! ```text
//! Committed sale #42
//!      │ reverse_sale()          stock += qty, sale removed
//!      ▼
//! EditDraft { cart, bill_no: 42 }
//!      │ commit_sale(preserved_bill_no = Some(42))
//!      ▼
//! Committed sale #42 (new id, new items); counter never rewinds
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::stock::{self, StockDelta};
use crate::types::{PaymentMode, Product, Sale, SaleItem, TaxRate};
use crate::validation::validate_quantity;

// =============================================================================
// Cart
// =============================================================================

/// A line in an in-progress cart.
///
/// `price` is captured when the product is added and becomes the sale's
/// price snapshot. `stock` is informational only; checkout re-reads the
/// live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit: String,
    pub price: Money,
    pub stock: i64,
    pub qty: i64,
}

impl CartLine {
    /// Captures a product into a cart line at its current shelf price.
    pub fn from_product(product: &Product, qty: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit: product.unit.clone(),
            price: product.sales_price,
            stock: product.stock,
            qty,
        }
    }

    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.qty)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Subtotal, tax and grand total for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    /// `subtotal = Σ price × qty`, `tax = subtotal × rate`,
    /// `total = round_half_up(subtotal × (1 + rate))` to a whole major unit.
    pub fn compute(lines: &[CartLine], rate: TaxRate) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
        SaleTotals {
            subtotal,
            tax: subtotal.calculate_tax(rate),
            total: subtotal.grand_total(rate),
        }
    }
}

// =============================================================================
// Bill Counter
// =============================================================================

/// The global last-issued bill number.
///
/// Only ever moves forward: [`BillCounter::ratchet`] ignores values that are
/// not greater than the stored one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillCounter(u64);

impl BillCounter {
    pub const fn new(last_issued: u64) -> Self {
        BillCounter(last_issued)
    }

    /// Last number handed out.
    pub const fn last_issued(&self) -> u64 {
        self.0
    }

    /// Number the next fresh checkout will receive.
    pub const fn peek_next(&self) -> u64 {
        self.0 + 1
    }

    /// Picks the bill number for a commit: the preserved one for an edit,
    /// otherwise the next fresh number. Does not advance the counter.
    pub fn allocate(&self, preserved: Option<u64>) -> u64 {
        preserved.unwrap_or_else(|| self.peek_next())
    }

    /// Advances to `issued` if it is larger than the stored value.
    pub fn ratchet(&mut self, issued: u64) {
        if issued > self.0 {
            self.0 = issued;
        }
    }
}

// =============================================================================
// Commit
// =============================================================================

/// Everything checkout needs besides the collections themselves.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub cart: Vec<CartLine>,
    pub mode: PaymentMode,
    pub customer: String,
    pub staff_id: Option<String>,
    pub tax_rate: TaxRate,
    /// Set when re-committing an edited sale.
    pub preserved_bill_no: Option<u64>,
}

/// Commits a checkout against the catalog and sales collection.
///
/// ## Arguments
/// * `products` - Live catalog (stock is decremented in place)
/// * `sales` - Sales collection (the new sale is appended)
/// * `counter` - Global bill counter (ratcheted forward)
/// * `request` - Cart and payment details
/// * `id` - Id for the new sale record
/// * `now` - Checkout time (local wall clock)
///
/// ## Errors
/// - `EmptyCart` when the cart has no lines
/// - `Validation` when a line quantity is not positive
/// - `ProductNotFound` when a line references a deleted product
/// - `InsufficientStock` when the summed quantity for a product exceeds its
///   live stock
/// - `Validation` when `preserved_bill_no` was never issued or already
///   belongs to a live sale
pub fn commit_sale(
    products: &mut [Product],
    sales: &mut Vec<Sale>,
    counter: &mut BillCounter,
    request: CheckoutRequest,
    id: String,
    now: NaiveDateTime,
) -> CoreResult<Sale> {
    if request.cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    for line in &request.cart {
        validate_quantity(line.qty)?;
    }
    if let Some(preserved) = request.preserved_bill_no {
        check_preserved_bill(sales, counter, preserved)?;
    }

    // The same product may appear on several lines; check the sum
    let mut requested: Vec<StockDelta> = Vec::new();
    for line in &request.cart {
        match requested.iter_mut().find(|d| d.product_id == line.product_id) {
            Some(existing) => existing.delta += line.qty,
            None => requested.push(StockDelta::new(line.product_id.clone(), line.qty)),
        }
    }
    for want in &requested {
        let live = products
            .iter()
            .find(|p| p.id == want.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(want.product_id.clone()))?;
        if want.delta > live.stock {
            return Err(CoreError::InsufficientStock {
                product: live.name.clone(),
                available: live.stock,
                requested: want.delta,
            });
        }
    }

    let totals = SaleTotals::compute(&request.cart, request.tax_rate);
    let bill_no = counter.allocate(request.preserved_bill_no);

    let decrements: Vec<StockDelta> = requested
        .into_iter()
        .map(|d| StockDelta::new(d.product_id, -d.delta))
        .collect();
    stock::apply(products, &decrements)?;

    let sale = Sale {
        id,
        bill_no,
        date: now,
        items: request
            .cart
            .into_iter()
            .map(|line| SaleItem {
                product_id: line.product_id,
                name: line.name,
                unit: line.unit,
                price: line.price,
                qty: line.qty,
            })
            .collect(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        mode: request.mode,
        customer: request.customer.trim().to_string(),
        staff_id: request.staff_id,
    };

    sales.push(sale.clone());
    counter.ratchet(bill_no);

    Ok(sale)
}

/// An edit may only reuse a bill number that was issued and whose sale has
/// since been reversed.
fn check_preserved_bill(sales: &[Sale], counter: &BillCounter, bill_no: u64) -> CoreResult<()> {
    if bill_no == 0 || bill_no > counter.last_issued() {
        return Err(ValidationError::OutOfRange {
            field: "bill_no".to_string(),
            min: 1,
            max: i64::try_from(counter.last_issued()).unwrap_or(i64::MAX),
        }
        .into());
    }
    if sales.iter().any(|s| s.bill_no == bill_no) {
        return Err(ValidationError::Duplicate {
            field: "bill_no".to_string(),
            value: bill_no.to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Reversal
// =============================================================================

/// Result of reversing a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversal {
    /// The removed sale record.
    pub sale: Sale,
    /// Product ids whose stock could not be restored because they are no
    /// longer in the catalog.
    pub missing_products: Vec<String>,
}

/// Removes a sale and restores every line's quantity to stock.
///
/// Lines whose product has since been deleted from the catalog are skipped
/// and reported in [`Reversal::missing_products`]; the sale is still removed.
pub fn reverse_sale(
    products: &mut [Product],
    sales: &mut Vec<Sale>,
    sale_id: &str,
) -> CoreResult<Reversal> {
    let index = sales
        .iter()
        .position(|s| s.id == sale_id)
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

    let sale = sales.remove(index);
    let mut missing_products = Vec::new();

    for item in &sale.items {
        if stock::adjust(products, &item.product_id, item.qty).is_err() {
            missing_products.push(item.product_id.clone());
        }
    }

    Ok(Reversal {
        sale,
        missing_products,
    })
}

// =============================================================================
// Edit Draft
// =============================================================================

/// A cart re-seeded from a reversed sale, ready to be re-committed under the
/// same bill number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EditDraft {
    pub cart: Vec<CartLine>,
    pub bill_no: u64,
    pub mode: PaymentMode,
    pub customer: String,
    pub staff_id: Option<String>,
}

impl EditDraft {
    /// Builds the draft from a sale that has already been reversed, so the
    /// cart's stock column reflects the restored quantities.
    pub fn from_reversed(sale: &Sale, products: &[Product]) -> Self {
        EditDraft {
            cart: cart_from_sale(sale, products),
            bill_no: sale.bill_no,
            mode: sale.mode,
            customer: sale.customer.clone(),
            staff_id: sale.staff_id.clone(),
        }
    }

    /// Turns the (possibly modified) draft into a checkout request.
    pub fn into_request(self, tax_rate: TaxRate) -> CheckoutRequest {
        CheckoutRequest {
            cart: self.cart,
            mode: self.mode,
            customer: self.customer,
            staff_id: self.staff_id,
            tax_rate,
            preserved_bill_no: Some(self.bill_no),
        }
    }
}

/// Cart lines for a sale's items, keeping the snapshot price and reading
/// stock from the live catalog (zero for deleted products).
pub fn cart_from_sale(sale: &Sale, products: &[Product]) -> Vec<CartLine> {
    sale.items
        .iter()
        .map(|item| CartLine {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            unit: item.unit.clone(),
            price: item.price,
            stock: stock::current(products, &item.product_id).unwrap_or(0),
            qty: item.qty,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn product(id: &str, name: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "Grocery".to_string(),
            unit: "kg".to_string(),
            purchase_price: Money::from_major(price - 10),
            sales_price: Money::from_major(price),
            stock,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn request(cart: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            cart,
            mode: PaymentMode::Cash,
            customer: "Walk-in".to_string(),
            staff_id: None,
            tax_rate: TaxRate::from_percentage(5.0),
            preserved_bill_no: None,
        }
    }

    #[test]
    fn test_checkout_scenario() {
        let mut products = vec![product("dal", "Toor Dal", 80, 10)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::new(0);

        let cart = vec![CartLine::from_product(&products[0], 3)];
        let sale = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart),
            "s-1".to_string(),
            now(),
        )
        .unwrap();

        assert_eq!(sale.subtotal, Money::from_major(240));
        assert_eq!(sale.tax, Money::from_major(12));
        assert_eq!(sale.total, Money::from_major(252));
        assert_eq!(sale.bill_no, 1);
        assert_eq!(products[0].stock, 7);
        assert_eq!(sales.len(), 1);
        assert_eq!(counter.last_issued(), 1);
    }

    #[test]
    fn test_checkout_rejects_insufficient_live_stock() {
        let mut products = vec![product("rice", "Basmati Rice", 90, 5)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::new(7);

        // Cart captured a stale stock of 50; the live catalog has 5
        let mut line = CartLine::from_product(&products[0], 6);
        line.stock = 50;

        let err = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(vec![line]),
            "s-1".to_string(),
            now(),
        )
        .unwrap_err();

        match err {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Basmati Rice");
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(products[0].stock, 5);
        assert!(sales.is_empty());
        assert_eq!(counter.last_issued(), 7);
    }

    #[test]
    fn test_checkout_sums_duplicate_lines_before_stock_check() {
        let mut products = vec![product("rice", "Basmati Rice", 90, 5)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::default();

        let cart = vec![
            CartLine::from_product(&products[0], 3),
            CartLine::from_product(&products[0], 3),
        ];
        let err = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart),
            "s-1".to_string(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { requested: 6, .. }));
        assert_eq!(products[0].stock, 5);
    }

    #[test]
    fn test_checkout_rejects_empty_and_zero_qty() {
        let mut products = vec![product("rice", "Rice", 90, 5)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::default();

        let err = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(vec![]),
            "s-1".to_string(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));

        let zero_line = CartLine::from_product(&products[0], 0);
        let err = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(vec![zero_line]),
            "s-1".to_string(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_partial_failure_leaves_everything_untouched() {
        let mut products = vec![
            product("rice", "Rice", 90, 10),
            product("oil", "Mustard Oil", 180, 1),
        ];
        let mut sales = Vec::new();
        let mut counter = BillCounter::default();

        let cart = vec![
            CartLine::from_product(&products[0], 2),
            CartLine::from_product(&products[1], 2),
        ];
        assert!(commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart),
            "s-1".to_string(),
            now(),
        )
        .is_err());

        assert_eq!(products[0].stock, 10);
        assert_eq!(products[1].stock, 1);
    }

    #[test]
    fn test_price_snapshot_survives_catalog_change() {
        let mut products = vec![product("dal", "Toor Dal", 80, 10)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::default();

        let cart = vec![CartLine::from_product(&products[0], 1)];
        commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart),
            "s-1".to_string(),
            now(),
        )
        .unwrap();

        products[0].sales_price = Money::from_major(95);
        assert_eq!(sales[0].items[0].price, Money::from_major(80));
    }

    #[test]
    fn test_bill_numbers_strictly_increase() {
        let mut products = vec![product("dal", "Toor Dal", 80, 100)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::new(41);

        let mut issued = Vec::new();
        for i in 0..3 {
            let cart = vec![CartLine::from_product(&products[0], 1)];
            let sale = commit_sale(
                &mut products,
                &mut sales,
                &mut counter,
                request(cart),
                format!("s-{i}"),
                now(),
            )
            .unwrap();
            issued.push(sale.bill_no);
        }
        assert_eq!(issued, vec![42, 43, 44]);
    }

    #[test]
    fn test_counter_ratchet_never_rewinds() {
        let mut counter = BillCounter::new(10);
        counter.ratchet(4);
        assert_eq!(counter.last_issued(), 10);
        counter.ratchet(12);
        assert_eq!(counter.last_issued(), 12);
        assert_eq!(counter.allocate(Some(5)), 5);
        assert_eq!(counter.allocate(None), 13);
    }

    #[test]
    fn test_reverse_restores_stock_exactly() {
        let mut products = vec![
            product("dal", "Toor Dal", 80, 10),
            product("rice", "Rice", 90, 4),
        ];
        let before: Vec<i64> = products.iter().map(|p| p.stock).collect();
        let mut sales = Vec::new();
        let mut counter = BillCounter::default();

        let cart = vec![
            CartLine::from_product(&products[0], 3),
            CartLine::from_product(&products[1], 4),
        ];
        let sale = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart),
            "s-1".to_string(),
            now(),
        )
        .unwrap();

        let reversal = reverse_sale(&mut products, &mut sales, &sale.id).unwrap();
        assert_eq!(reversal.sale, sale);
        assert!(reversal.missing_products.is_empty());
        assert!(sales.is_empty());

        let after: Vec<i64> = products.iter().map(|p| p.stock).collect();
        assert_eq!(before, after);
        // Reversal never hands a bill number back
        assert_eq!(counter.last_issued(), 1);
    }

    #[test]
    fn test_reverse_skips_deleted_products() {
        let mut products = vec![product("dal", "Toor Dal", 80, 10)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::default();

        let cart = vec![CartLine::from_product(&products[0], 2)];
        commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart),
            "s-1".to_string(),
            now(),
        )
        .unwrap();

        products.clear();
        let reversal = reverse_sale(&mut products, &mut sales, "s-1").unwrap();
        assert_eq!(reversal.missing_products, vec!["dal".to_string()]);
        assert!(sales.is_empty());
    }

    #[test]
    fn test_reverse_unknown_sale() {
        let mut products = Vec::new();
        let mut sales = Vec::new();
        let err = reverse_sale(&mut products, &mut sales, "nope").unwrap_err();
        assert!(matches!(err, CoreError::SaleNotFound(_)));
    }

    #[test]
    fn test_edit_cycle_preserves_bill_number() {
        let mut products = vec![product("dal", "Toor Dal", 80, 10)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::new(99);

        let cart = vec![CartLine::from_product(&products[0], 2)];
        commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart),
            "s-1".to_string(),
            now(),
        )
        .unwrap();

        let reversal = reverse_sale(&mut products, &mut sales, "s-1").unwrap();
        let mut draft = EditDraft::from_reversed(&reversal.sale, &products);
        assert_eq!(draft.bill_no, 100);
        assert_eq!(draft.cart[0].stock, 10);

        draft.cart[0].qty = 5;
        let edited = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            draft.into_request(TaxRate::zero()),
            "s-2".to_string(),
            now(),
        )
        .unwrap();

        assert_eq!(edited.bill_no, 100);
        assert_eq!(products[0].stock, 5);
        assert_eq!(counter.last_issued(), 100);
        assert_eq!(counter.peek_next(), 101);
    }

    #[test]
    fn test_preserved_bill_must_be_issued_and_free() {
        let mut products = vec![product("dal", "Toor Dal", 80, 10)];
        let mut sales = Vec::new();
        let mut counter = BillCounter::new(0);

        let cart = vec![CartLine::from_product(&products[0], 1)];
        let first = commit_sale(
            &mut products,
            &mut sales,
            &mut counter,
            request(cart.clone()),
            "s-1".to_string(),
            now(),
        )
        .unwrap();

        // Bill 1 still belongs to a live sale
        let mut reuse = request(cart.clone());
        reuse.preserved_bill_no = Some(first.bill_no);
        let err = commit_sale(&mut products, &mut sales, &mut counter, reuse, "s-2".to_string(), now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));

        // Bill 7 was never issued
        let mut future = request(cart.clone());
        future.preserved_bill_no = Some(7);
        let err = commit_sale(&mut products, &mut sales, &mut counter, future, "s-3".to_string(), now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        assert_eq!(sales.len(), 1);
        assert_eq!(products[0].stock, 9);
        assert_eq!(counter.last_issued(), 1);

        // Once reversed, the number may be reused exactly once
        reverse_sale(&mut products, &mut sales, "s-1").unwrap();
        let mut edit = request(cart.clone());
        edit.preserved_bill_no = Some(1);
        commit_sale(&mut products, &mut sales, &mut counter, edit.clone(), "s-4".to_string(), now())
            .unwrap();
        assert!(commit_sale(&mut products, &mut sales, &mut counter, edit, "s-5".to_string(), now()).is_err());
        assert_eq!(sales.len(), 1);
    }
}
