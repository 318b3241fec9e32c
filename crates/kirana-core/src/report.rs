//! # Daily Report Aggregator
//!
//! Composes sales, purchases, expenses, payroll and the opening balance for
//! one calendar day into a financial and stock-movement summary.
//!
//! ## Data Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         build_report(date)                              │
//! │                                                                         │
//! │  sales (same local day) ──┬──► total / cash / upi sales                 │
//! │                           ├──► gross profit  (LIVE catalog prices)      │
//! │                           └──► stock out                                │
//! │  purchases (date)  ───────┬──► total purchases                          │
//! │                           └──► stock in                                 │
//! │  staff payments (paid on date) ──► salary expense ─┐                    │
//! │  expenses (date)  ───────────────► other expenses ─┴► net profit        │
//! │  daily log (date) ───────────────► opening balance ──► cash in hand     │
//! │  catalog ────────────────────────► current stock per movement row       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Modeling Choices
//! - Gross profit uses the catalog's **current** sales and purchase prices,
//!   not the sale's price snapshot. Editing a price later changes the
//!   reported profit of past days.
//! - Cash in hand is opening balance plus cash sales; expenses are not
//!   subtracted.
//! - `current_stock` is the live catalog value, not a reconstruction for
//!   the report date.
//! - The free-text filter narrows `transactions` only. Totals always cover
//!   the whole day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DailyLog, Expense, PaymentMode, Product, Purchase, Sale, Staff};

/// Borrowed view over every collection the report reads.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub products: &'a [Product],
    pub sales: &'a [Sale],
    pub purchases: &'a [Purchase],
    pub expenses: &'a [Expense],
    pub staff: &'a [Staff],
    pub daily_logs: &'a [DailyLog],
}

/// Quantity in/out for one product on the report date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockMovement {
    pub product_id: String,
    pub name: String,
    pub stock_in: i64,
    pub stock_out: i64,
    pub net: i64,
    /// Live catalog stock; `None` if the product has been deleted.
    pub current_stock: Option<i64>,
}

/// The daily financial summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyReport {
    #[ts(as = "String")]
    pub date: NaiveDate,

    pub sale_count: usize,
    pub items_sold: i64,
    pub total_sales: Money,
    pub cash_sales: Money,
    pub upi_sales: Money,

    pub gross_profit: Money,
    pub salary_expense: Money,
    pub other_expenses: Money,
    pub total_expenses: Money,
    pub net_profit: Money,

    pub total_purchases: Money,

    pub opening_balance: Money,
    pub cash_in_hand: Money,

    pub stock_movement: Vec<StockMovement>,

    /// Day's sales, narrowed by the filter when one is given.
    pub transactions: Vec<Sale>,
}

/// Builds the report for `date`.
///
/// Pure and deterministic: the same inputs always produce the same report.
pub fn build_report(inputs: ReportInputs<'_>, date: NaiveDate, filter: Option<&str>) -> DailyReport {
    let day_sales: Vec<&Sale> = inputs.sales.iter().filter(|s| s.occurred_on(date)).collect();
    let day_purchases: Vec<&Purchase> = inputs.purchases.iter().filter(|p| p.date == date).collect();

    // ------------------------------------------------------------------
    // Revenue
    // ------------------------------------------------------------------
    let total_sales: Money = day_sales.iter().map(|s| s.total).sum();
    let cash_sales: Money = day_sales
        .iter()
        .filter(|s| s.mode == PaymentMode::Cash)
        .map(|s| s.total)
        .sum();
    let upi_sales: Money = day_sales
        .iter()
        .filter(|s| s.mode == PaymentMode::Upi)
        .map(|s| s.total)
        .sum();
    let items_sold: i64 = day_sales.iter().map(|s| s.item_count()).sum();

    // ------------------------------------------------------------------
    // Profit (live catalog prices; deleted products contribute nothing)
    // ------------------------------------------------------------------
    let gross_profit: Money = day_sales
        .iter()
        .flat_map(|s| s.items.iter())
        .filter_map(|item| {
            inputs
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .map(|p| p.unit_margin().multiply_quantity(item.qty))
        })
        .sum();

    let salary_expense: Money = inputs
        .staff
        .iter()
        .flat_map(|member| member.salary_payments.iter())
        .filter(|payment| payment.paid_on(date))
        .map(|payment| payment.amount)
        .sum();
    let other_expenses: Money = inputs
        .expenses
        .iter()
        .filter(|e| e.date == date)
        .map(|e| e.amount)
        .sum();
    let total_expenses = salary_expense + other_expenses;

    // ------------------------------------------------------------------
    // Cash
    // ------------------------------------------------------------------
    let opening_balance = inputs
        .daily_logs
        .iter()
        .find(|log| log.date == date)
        .map(|log| log.opening_balance)
        .unwrap_or_default();

    let total_purchases: Money = day_purchases.iter().map(|p| p.total_amount).sum();

    let transactions = match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(query) => day_sales
            .iter()
            .filter(|s| s.matches_filter(query))
            .map(|s| (*s).clone())
            .collect(),
        None => day_sales.iter().map(|s| (*s).clone()).collect(),
    };

    DailyReport {
        date,
        sale_count: day_sales.len(),
        items_sold,
        total_sales,
        cash_sales,
        upi_sales,
        gross_profit,
        salary_expense,
        other_expenses,
        total_expenses,
        net_profit: gross_profit - total_expenses,
        total_purchases,
        opening_balance,
        cash_in_hand: opening_balance + cash_sales,
        stock_movement: stock_movement(inputs.products, &day_sales, &day_purchases),
        transactions,
    }
}

/// Per-product in/out table for the given day's records, sorted by name.
fn stock_movement(products: &[Product], sales: &[&Sale], purchases: &[&Purchase]) -> Vec<StockMovement> {
    let mut rows: Vec<StockMovement> = Vec::new();

    let mut touch = |product_id: &str, snapshot_name: &str| -> usize {
        if let Some(index) = rows.iter().position(|r| r.product_id == product_id) {
            return index;
        }
        let live = products.iter().find(|p| p.id == product_id);
        rows.push(StockMovement {
            product_id: product_id.to_string(),
            name: live
                .map(|p| p.name.clone())
                .unwrap_or_else(|| snapshot_name.to_string()),
            stock_in: 0,
            stock_out: 0,
            net: 0,
            current_stock: live.map(|p| p.stock),
        });
        rows.len() - 1
    };

    let mut ins: Vec<(usize, i64)> = Vec::new();
    for purchase in purchases {
        for item in &purchase.items {
            ins.push((touch(&item.product_id, &item.product_name), item.quantity));
        }
    }
    let mut outs: Vec<(usize, i64)> = Vec::new();
    for sale in sales {
        for item in &sale.items {
            outs.push((touch(&item.product_id, &item.name), item.qty));
        }
    }

    for (index, qty) in ins {
        rows[index].stock_in += qty;
    }
    for (index, qty) in outs {
        rows[index].stock_out += qty;
    }
    for row in &mut rows {
        row.net = row.stock_in - row.stock_out;
    }

    rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PurchaseItem, SalaryPayment, SaleItem};
    use chrono::NaiveDateTime;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn at(d: NaiveDate, h: u32) -> NaiveDateTime {
        d.and_hms_opt(h, 0, 0).unwrap()
    }

    fn product(id: &str, name: &str, cost: i64, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: String::new(),
            unit: "pcs".to_string(),
            purchase_price: Money::from_major(cost),
            sales_price: Money::from_major(price),
            stock,
        }
    }

    fn sale(id: &str, bill_no: u64, when: NaiveDateTime, mode: PaymentMode, customer: &str, items: Vec<(&str, i64, i64)>) -> Sale {
        let items: Vec<SaleItem> = items
            .into_iter()
            .map(|(pid, price, qty)| SaleItem {
                product_id: pid.to_string(),
                name: pid.to_string(),
                unit: "pcs".to_string(),
                price: Money::from_major(price),
                qty,
            })
            .collect();
        let subtotal: Money = items.iter().map(SaleItem::line_total).sum();
        Sale {
            id: id.to_string(),
            bill_no,
            date: when,
            items,
            subtotal,
            tax: Money::zero(),
            total: subtotal,
            mode,
            customer: customer.to_string(),
            staff_id: None,
        }
    }

    struct Fixture {
        products: Vec<Product>,
        sales: Vec<Sale>,
        purchases: Vec<Purchase>,
        expenses: Vec<Expense>,
        staff: Vec<Staff>,
        logs: Vec<DailyLog>,
    }

    impl Fixture {
        fn inputs(&self) -> ReportInputs<'_> {
            ReportInputs {
                products: &self.products,
                sales: &self.sales,
                purchases: &self.purchases,
                expenses: &self.expenses,
                staff: &self.staff,
                daily_logs: &self.logs,
            }
        }
    }

    fn fixture() -> Fixture {
        let yesterday = day().pred_opt().unwrap();
        Fixture {
            products: vec![
                product("dal", "Toor Dal", 70, 80, 20),
                product("soap", "Bath Soap", 30, 40, 9),
            ],
            sales: vec![
                sale("s1", 101, at(day(), 9), PaymentMode::Cash, "Ramesh", vec![("dal", 80, 3)]),
                sale("s2", 102, at(day(), 18), PaymentMode::Upi, "Sita", vec![("dal", 80, 1), ("soap", 40, 2)]),
                sale("s0", 100, at(yesterday, 20), PaymentMode::Cash, "", vec![("soap", 40, 10)]),
            ],
            purchases: vec![Purchase {
                id: "pu1".to_string(),
                date: day(),
                supplier: "Agarwal".to_string(),
                items: vec![PurchaseItem {
                    product_id: "soap".to_string(),
                    product_name: "Bath Soap".to_string(),
                    quantity: 12,
                    purchase_price: Money::from_major(30),
                }],
                total_amount: Money::from_major(360),
                notes: String::new(),
            }],
            expenses: vec![
                Expense {
                    id: "e1".to_string(),
                    date: day(),
                    description: "Tea".to_string(),
                    category: "Misc".to_string(),
                    amount: Money::from_major(20),
                },
                Expense {
                    id: "e0".to_string(),
                    date: yesterday,
                    description: "Rent".to_string(),
                    category: "Rent".to_string(),
                    amount: Money::from_major(5000),
                },
            ],
            staff: vec![Staff {
                id: "st1".to_string(),
                name: "Meena".to_string(),
                phone: String::new(),
                role: String::new(),
                salary: Money::from_major(9000),
                attendance_records: vec![],
                salary_payments: vec![
                    SalaryPayment {
                        month: 2,
                        year: 2024,
                        amount: Money::from_major(15),
                        paid: true,
                        paid_date: Some(day()),
                    },
                    SalaryPayment {
                        month: 3,
                        year: 2024,
                        amount: Money::from_major(999),
                        paid: false,
                        paid_date: Some(day()),
                    },
                ],
                financial_records: vec![],
            }],
            logs: vec![DailyLog {
                date: day(),
                opening_balance: Money::from_major(500),
            }],
        }
    }

    #[test]
    fn test_daily_totals() {
        let f = fixture();
        let report = build_report(f.inputs(), day(), None);

        assert_eq!(report.sale_count, 2);
        assert_eq!(report.items_sold, 6);
        assert_eq!(report.cash_sales, Money::from_major(240));
        assert_eq!(report.upi_sales, Money::from_major(160));
        assert_eq!(report.total_sales, Money::from_major(400));
        assert_eq!(report.total_purchases, Money::from_major(360));
    }

    #[test]
    fn test_profit_and_expenses() {
        let f = fixture();
        let report = build_report(f.inputs(), day(), None);

        // dal: (80-70)×4 = 40, soap: (40-30)×2 = 20
        assert_eq!(report.gross_profit, Money::from_major(60));
        // Only the paid payment dated today counts
        assert_eq!(report.salary_expense, Money::from_major(15));
        assert_eq!(report.other_expenses, Money::from_major(20));
        assert_eq!(report.total_expenses, Money::from_major(35));
        assert_eq!(report.net_profit, Money::from_major(25));
    }

    #[test]
    fn test_profit_follows_live_catalog_prices() {
        let mut f = fixture();
        let before = build_report(f.inputs(), day(), None).gross_profit;

        f.products[0].sales_price = Money::from_major(90);
        let after = build_report(f.inputs(), day(), None).gross_profit;

        assert_eq!(after - before, Money::from_major(40));
    }

    #[test]
    fn test_deleted_product_contributes_no_profit() {
        let mut f = fixture();
        f.products.retain(|p| p.id != "dal");
        let report = build_report(f.inputs(), day(), None);
        assert_eq!(report.gross_profit, Money::from_major(20));

        let dal = report
            .stock_movement
            .iter()
            .find(|row| row.product_id == "dal")
            .unwrap();
        assert_eq!(dal.current_stock, None);
        assert_eq!(dal.name, "dal");
    }

    #[test]
    fn test_cash_in_hand_ignores_expenses() {
        let f = fixture();
        let report = build_report(f.inputs(), day(), None);
        assert_eq!(report.opening_balance, Money::from_major(500));
        assert_eq!(report.cash_in_hand, Money::from_major(740));
    }

    #[test]
    fn test_missing_daily_log_defaults_to_zero() {
        let mut f = fixture();
        f.logs.clear();
        let report = build_report(f.inputs(), day(), None);
        assert!(report.opening_balance.is_zero());
        assert_eq!(report.cash_in_hand, Money::from_major(240));
    }

    #[test]
    fn test_stock_movement_table() {
        let f = fixture();
        let report = build_report(f.inputs(), day(), None);

        assert_eq!(report.stock_movement.len(), 2);
        // Sorted by name: Bath Soap, Toor Dal
        let soap = &report.stock_movement[0];
        assert_eq!(soap.name, "Bath Soap");
        assert_eq!(soap.stock_in, 12);
        assert_eq!(soap.stock_out, 2);
        assert_eq!(soap.net, 10);
        assert_eq!(soap.current_stock, Some(9));

        let dal = &report.stock_movement[1];
        assert_eq!(dal.stock_in, 0);
        assert_eq!(dal.stock_out, 4);
        assert_eq!(dal.net, -4);
    }

    #[test]
    fn test_filter_narrows_transactions_only() {
        let f = fixture();
        let full = build_report(f.inputs(), day(), None);
        let filtered = build_report(f.inputs(), day(), Some("sita"));

        assert_eq!(filtered.transactions.len(), 1);
        assert_eq!(filtered.transactions[0].bill_no, 102);
        assert_eq!(filtered.total_sales, full.total_sales);
        assert_eq!(filtered.sale_count, full.sale_count);

        let by_bill = build_report(f.inputs(), day(), Some("101"));
        assert_eq!(by_bill.transactions[0].id, "s1");

        let blank = build_report(f.inputs(), day(), Some("  "));
        assert_eq!(blank.transactions.len(), 2);
    }

    #[test]
    fn test_report_is_idempotent() {
        let f = fixture();
        assert_eq!(
            build_report(f.inputs(), day(), None),
            build_report(f.inputs(), day(), None)
        );
    }

    #[test]
    fn test_empty_day() {
        let f = fixture();
        let report = build_report(f.inputs(), NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), None);
        assert_eq!(report.sale_count, 0);
        assert!(report.total_sales.is_zero());
        assert!(report.stock_movement.is_empty());
        assert!(report.transactions.is_empty());
    }
}
