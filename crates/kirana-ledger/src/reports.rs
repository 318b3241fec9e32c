//! # Daily Report Service
//!
//! Reads a consistent snapshot of the store and hands it to
//! `kirana_core::report::build_report`. Also owns the daily log (opening
//! cash balance) that feeds cash-in-hand.
//!
//! ```text
//! snapshot ──► ReportInputs ──► build_report(date, filter) ──► DailyReport
//!                                                      │
//!                                   export_report ◄────┘  (CSV sections)
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::LedgerResult;
use crate::transfer::write_csv;
use crate::Ledger;
use kirana_core::report::{self, DailyReport, ReportInputs};
use kirana_core::types::sale_timestamp;
use kirana_core::validation::{validate_price, validate_search_query};
use kirana_core::{ChangeSet, Collection, DailyLog, Money};

/// Report operations bound to a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct ReportService<'a> {
    ledger: &'a Ledger,
}

impl<'a> ReportService<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        ReportService { ledger }
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Builds the report for `date`.
    ///
    /// `filter` (bill number or customer substring) narrows only the
    /// transaction list; every total covers the whole day.
    pub async fn daily_report(&self, date: NaiveDate, filter: Option<&str>) -> LedgerResult<DailyReport> {
        let filter = filter.map(validate_search_query).transpose()?;

        let snapshot = self.ledger.snapshot().await?;
        let report = report::build_report(
            ReportInputs {
                products: &snapshot.products,
                sales: &snapshot.sales,
                purchases: &snapshot.purchases,
                expenses: &snapshot.expenses,
                staff: &snapshot.staff,
                daily_logs: &snapshot.daily_logs,
            },
            date,
            filter.as_deref(),
        );

        debug!(
            %date,
            sales = report.sale_count,
            total = %report.total_sales,
            net = %report.net_profit,
            "Daily report built"
        );
        Ok(report)
    }

    /// The unfiltered report for `date` as CSV: a summary section, the
    /// day's transactions and the stock movement table, each preceded by a
    /// title line and separated by a blank line.
    pub async fn export_report(&self, date: NaiveDate) -> LedgerResult<String> {
        let report = self.daily_report(date, None).await?;

        let summary = write_csv(&summary_rows(&report))?;
        let transactions = write_csv(
            &report
                .transactions
                .iter()
                .map(|sale| TransactionRow {
                    bill_no: sale.bill_no,
                    time: sale_timestamp::format(&sale.date),
                    customer: sale.customer.clone(),
                    mode: sale.mode.as_str(),
                    items: sale.item_count(),
                    subtotal: sale.subtotal.to_string(),
                    tax: sale.tax.to_string(),
                    total: sale.total.to_string(),
                })
                .collect::<Vec<_>>(),
        )?;
        let movement = write_csv(
            &report
                .stock_movement
                .iter()
                .map(|m| MovementRow {
                    product: m.name.clone(),
                    stock_in: m.stock_in,
                    stock_out: m.stock_out,
                    net: m.net,
                    current_stock: m.current_stock,
                })
                .collect::<Vec<_>>(),
        )?;

        Ok(format!(
            "Daily Report {}\n\nSummary\n{}\nTransactions\n{}\nStock Movement\n{}",
            date, summary, transactions, movement
        ))
    }

    // =========================================================================
    // Daily Log
    // =========================================================================

    /// Sets the opening cash balance for `date`, replacing any earlier value.
    pub async fn set_opening_balance(&self, date: NaiveDate, amount: Money) -> LedgerResult<DailyLog> {
        validate_price("opening_balance", amount)?;

        let _guard = self.ledger.lock_writes().await;
        let mut logs = self.daily_logs().await?;

        let entry = DailyLog {
            date,
            opening_balance: amount,
        };
        match logs.iter_mut().find(|log| log.date == date) {
            Some(existing) => *existing = entry.clone(),
            None => logs.push(entry.clone()),
        }

        self.ledger
            .commit(ChangeSet::new().with_daily_logs(logs))
            .await?;

        info!(%date, amount = %amount, "Opening balance set");
        Ok(entry)
    }

    /// Opening balance for `date`; zero when none was entered.
    pub async fn opening_balance(&self, date: NaiveDate) -> LedgerResult<Money> {
        Ok(self
            .daily_logs()
            .await?
            .into_iter()
            .find(|log| log.date == date)
            .map(|log| log.opening_balance)
            .unwrap_or_default())
    }

    async fn daily_logs(&self) -> LedgerResult<Vec<DailyLog>> {
        Ok(self
            .ledger
            .database()
            .documents()
            .get(Collection::DailyLogs)
            .await?)
    }
}

// =============================================================================
// Export Rows
// =============================================================================

#[derive(Debug, Serialize)]
struct SummaryRow {
    #[serde(rename = "Metric")]
    metric: &'static str,
    #[serde(rename = "Amount")]
    amount: String,
}

fn summary_rows(report: &DailyReport) -> Vec<SummaryRow> {
    let row = |metric, amount: String| SummaryRow { metric, amount };
    vec![
        row("Sales Count", report.sale_count.to_string()),
        row("Items Sold", report.items_sold.to_string()),
        row("Total Sales", report.total_sales.to_string()),
        row("Cash Sales", report.cash_sales.to_string()),
        row("UPI Sales", report.upi_sales.to_string()),
        row("Gross Profit", report.gross_profit.to_string()),
        row("Salary Expense", report.salary_expense.to_string()),
        row("Other Expenses", report.other_expenses.to_string()),
        row("Total Expenses", report.total_expenses.to_string()),
        row("Net Profit", report.net_profit.to_string()),
        row("Total Purchases", report.total_purchases.to_string()),
        row("Opening Balance", report.opening_balance.to_string()),
        row("Cash In Hand", report.cash_in_hand.to_string()),
    ]
}

#[derive(Debug, Serialize)]
struct TransactionRow {
    #[serde(rename = "Bill No")]
    bill_no: u64,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Customer")]
    customer: String,
    #[serde(rename = "Mode")]
    mode: &'static str,
    #[serde(rename = "Items")]
    items: i64,
    #[serde(rename = "Subtotal")]
    subtotal: String,
    #[serde(rename = "Tax")]
    tax: String,
    #[serde(rename = "Total")]
    total: String,
}

#[derive(Debug, Serialize)]
struct MovementRow {
    #[serde(rename = "Product")]
    product: String,
    #[serde(rename = "In")]
    stock_in: i64,
    #[serde(rename = "Out")]
    stock_out: i64,
    #[serde(rename = "Net")]
    net: i64,
    #[serde(rename = "Current Stock")]
    current_stock: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================
