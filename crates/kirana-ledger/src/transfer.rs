//! # Tabular Import / Export
//!
//! Spreadsheet-shaped data in and out of the ledger, as CSV.
//!
//! ## Sheets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  import_products(csv)     Name, Category, Price, Purchase Price,       │
//! │                           Stock, Unit (with aliases) → upsert by name  │
//! │                                                                         │
//! │  export_workbook()        Products │ Sales │ Purchases │ Expenses │    │
//! │                           Staff                                        │
//! │                           Sales/Purchases carry a readable "Items"     │
//! │                           column plus itemsJson for restore            │
//! │                                                                         │
//! │  restore_sales(csv)       Sales sheet → sale records (by itemsJson)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::Ledger;
use kirana_core::import::{self, ImportRow, ImportSummary};
use kirana_core::sale::BillCounter;
use kirana_core::types::sale_timestamp;
use kirana_core::{
    ChangeSet, Expense, Money, PaymentMode, Product, Purchase, Sale, SaleItem, Staff,
};

/// One exported sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub csv: String,
}

/// Import/export operations bound to a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    ledger: &'a Ledger,
}

impl<'a> Transfer<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        Transfer { ledger }
    }

    // =========================================================================
    // Product Import
    // =========================================================================

    /// Upserts products from a CSV sheet.
    ///
    /// Rows whose name matches an existing product (case-insensitively) add
    /// their stock to it and overwrite any supplied prices/category. Other
    /// rows become new products. Rows without a name are skipped.
    ///
    /// A malformed cell rejects the whole import.
    pub async fn import_products(&self, csv_text: &str) -> LedgerResult<ImportSummary> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        debug!(?headers, "Import headers");

        let mut rows = Vec::new();
        let mut skipped = 0;
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            match ImportRow::from_cells(&headers, &cells)? {
                Some(row) => rows.push(row),
                None => {
                    // Header is line 1
                    warn!(line = index + 2, "Skipping import row without a name");
                    skipped += 1;
                }
            }
        }

        let _guard = self.ledger.lock_writes().await;
        let mut snapshot = self.ledger.snapshot().await?;

        let mut summary =
            import::upsert_rows(&mut snapshot.products, rows, || self.ledger.new_id())?;
        summary.skipped += skipped;

        self.ledger
            .commit(ChangeSet::new().with_products(snapshot.products))
            .await?;

        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            "Products imported"
        );
        Ok(summary)
    }

    // =========================================================================
    // Workbook Export
    // =========================================================================

    /// One sheet per entity collection.
    pub async fn export_workbook(&self) -> LedgerResult<Vec<Sheet>> {
        let snapshot = self.ledger.snapshot().await?;

        let products: Vec<ProductRow> = snapshot.products.iter().map(ProductRow::from).collect();
        let sales = snapshot
            .sales
            .iter()
            .map(SaleRow::try_from)
            .collect::<LedgerResult<Vec<_>>>()?;
        let purchases = snapshot
            .purchases
            .iter()
            .map(PurchaseRow::try_from)
            .collect::<LedgerResult<Vec<_>>>()?;
        let expenses: Vec<ExpenseRow> = snapshot.expenses.iter().map(ExpenseRow::from).collect();
        let staff: Vec<StaffRow> = snapshot.staff.iter().map(StaffRow::from).collect();

        let sheets = vec![
            sheet("Products", &products)?,
            sheet("Sales", &sales)?,
            sheet("Purchases", &purchases)?,
            sheet("Expenses", &expenses)?,
            sheet("Staff", &staff)?,
        ];

        info!(
            products = products.len(),
            sales = sales.len(),
            purchases = purchases.len(),
            "Workbook exported"
        );
        Ok(sheets)
    }

    // =========================================================================
    // Sales Restore
    // =========================================================================

    /// Rebuilds sale records from an exported Sales sheet.
    ///
    /// Sales whose id already exists are left alone. Stock is not touched:
    /// exported stock already reflects these sales. The bill counter is
    /// ratcheted to the highest restored bill number.
    ///
    /// Returns the number of sales added.
    pub async fn restore_sales(&self, csv_text: &str) -> LedgerResult<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let mut incoming = Vec::new();
        for row in reader.deserialize::<SaleRow>() {
            incoming.push(Sale::try_from(row?)?);
        }

        let _guard = self.ledger.lock_writes().await;
        let mut snapshot = self.ledger.snapshot().await?;
        let mut counter = BillCounter::new(snapshot.last_bill_number);

        let mut restored = 0;
        for sale in incoming {
            if snapshot.sales.iter().any(|s| s.id == sale.id) {
                debug!(sale_id = %sale.id, "Sale already present, skipping");
                continue;
            }
            counter.ratchet(sale.bill_no);
            snapshot.sales.push(sale);
            restored += 1;
        }

        if restored > 0 {
            self.ledger
                .commit(
                    ChangeSet::new()
                        .with_sales(snapshot.sales)
                        .with_last_bill_number(counter.last_issued()),
                )
                .await?;
        }

        info!(restored, "Sales restored");
        Ok(restored)
    }
}

// =============================================================================
// CSV Helpers
// =============================================================================

/// Serializes rows with a header line taken from the row type.
pub(crate) fn write_csv<T: Serialize>(rows: &[T]) -> LedgerResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| LedgerError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| LedgerError::invalid_data("csv output", e))
}

fn sheet<T: Serialize>(name: &str, rows: &[T]) -> LedgerResult<Sheet> {
    Ok(Sheet {
        name: name.to_string(),
        csv: write_csv(rows)?,
    })
}

fn parse_money(context: &str, raw: &str) -> LedgerResult<Money> {
    Money::parse_decimal(raw).map_err(|e| LedgerError::invalid_data(context, e))
}

/// "Rice x 2 @ 45.00; Dal x 1 @ 120.00"
fn item_summary<'i, I>(items: I) -> String
where
    I: Iterator<Item = (&'i str, i64, Money)>,
{
    items
        .map(|(name, qty, price)| format!("{} x {} @ {}", name, qty, price))
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Row Shapes
// =============================================================================

#[derive(Debug, Serialize)]
struct ProductRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Unit")]
    unit: String,
    #[serde(rename = "Purchase Price")]
    purchase_price: String,
    #[serde(rename = "Sales Price")]
    sales_price: String,
    #[serde(rename = "Stock")]
    stock: i64,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        ProductRow {
            id: p.id.clone(),
            name: p.name.clone(),
            category: p.category.clone(),
            unit: p.unit.clone(),
            purchase_price: p.purchase_price.to_string(),
            sales_price: p.sales_price.to_string(),
            stock: p.stock,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SaleRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Bill No")]
    bill_no: u64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Customer", default)]
    customer: String,
    #[serde(rename = "Mode")]
    mode: String,
    #[serde(rename = "Staff Id", default)]
    staff_id: Option<String>,
    #[serde(rename = "Items", default)]
    items: String,
    #[serde(rename = "Subtotal")]
    subtotal: String,
    #[serde(rename = "Tax")]
    tax: String,
    #[serde(rename = "Total")]
    total: String,
    #[serde(rename = "itemsJson")]
    items_json: String,
}

impl TryFrom<&Sale> for SaleRow {
    type Error = LedgerError;

    fn try_from(s: &Sale) -> LedgerResult<Self> {
        Ok(SaleRow {
            id: s.id.clone(),
            bill_no: s.bill_no,
            date: sale_timestamp::format(&s.date),
            customer: s.customer.clone(),
            mode: s.mode.as_str().to_string(),
            staff_id: s.staff_id.clone(),
            items: item_summary(s.items.iter().map(|i| (i.name.as_str(), i.qty, i.price))),
            subtotal: s.subtotal.to_string(),
            tax: s.tax.to_string(),
            total: s.total.to_string(),
            items_json: serde_json::to_string(&s.items)
                .map_err(|e| LedgerError::invalid_data("itemsJson", e))?,
        })
    }
}

impl TryFrom<SaleRow> for Sale {
    type Error = LedgerError;

    fn try_from(row: SaleRow) -> LedgerResult<Self> {
        let context = format!("sale {}", row.bill_no);

        let date = sale_timestamp::parse(&row.date)
            .ok_or_else(|| LedgerError::invalid_data(&context, format!("bad date '{}'", row.date)))?;
        let mode: PaymentMode = row
            .mode
            .parse()
            .map_err(|e: String| LedgerError::invalid_data(&context, e))?;
        let items: Vec<SaleItem> = serde_json::from_str(&row.items_json)
            .map_err(|e| LedgerError::invalid_data(&context, e))?;

        Ok(Sale {
            id: row.id,
            bill_no: row.bill_no,
            date,
            items,
            subtotal: parse_money(&context, &row.subtotal)?,
            tax: parse_money(&context, &row.tax)?,
            total: parse_money(&context, &row.total)?,
            mode,
            customer: row.customer,
            staff_id: row.staff_id.filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
struct PurchaseRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Supplier")]
    supplier: String,
    #[serde(rename = "Items")]
    items: String,
    #[serde(rename = "Total Amount")]
    total_amount: String,
    #[serde(rename = "Notes")]
    notes: String,
    #[serde(rename = "itemsJson")]
    items_json: String,
}

impl TryFrom<&Purchase> for PurchaseRow {
    type Error = LedgerError;

    fn try_from(p: &Purchase) -> LedgerResult<Self> {
        Ok(PurchaseRow {
            id: p.id.clone(),
            date: p.date.to_string(),
            supplier: p.supplier.clone(),
            items: item_summary(
                p.items
                    .iter()
                    .map(|i| (i.product_name.as_str(), i.quantity, i.purchase_price)),
            ),
            total_amount: p.total_amount.to_string(),
            notes: p.notes.clone(),
            items_json: serde_json::to_string(&p.items)
                .map_err(|e| LedgerError::invalid_data("itemsJson", e))?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ExpenseRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Amount")]
    amount: String,
}

impl From<&Expense> for ExpenseRow {
    fn from(e: &Expense) -> Self {
        ExpenseRow {
            id: e.id.clone(),
            date: e.date.to_string(),
            description: e.description.clone(),
            category: e.category.clone(),
            amount: e.amount.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StaffRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Phone")]
    phone: String,
    #[serde(rename = "Role")]
    role: String,
    #[serde(rename = "Salary")]
    salary: String,
    #[serde(rename = "Attendance Days")]
    attendance_days: usize,
    #[serde(rename = "Payments")]
    payments: usize,
}

impl From<&Staff> for StaffRow {
    fn from(s: &Staff) -> Self {
        StaffRow {
            id: s.id.clone(),
            name: s.name.clone(),
            phone: s.phone.clone(),
            role: s.role.clone(),
            salary: s.salary.to_string(),
            attendance_days: s.attendance_records.len(),
            payments: s.salary_payments.len(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::Checkout;
    use crate::testing::*;
    use crate::ErrorKind;
    use kirana_core::sale::CartLine;

    const SHEET: &str = "\
Product,Category,SalesPrice,Cost,Qty,unit
rice,Grains,82.50,71,10,
Sugar,Grocery,\"1,200.00\",40,25,kg
,,,,,
";

    #[tokio::test]
    async fn test_import_upserts_by_name() {
        let ledger = stocked_ledger().await;

        let summary = ledger.transfer().import_products(SHEET).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                created: 1,
                updated: 1,
                skipped: 1
            }
        );

        let rice = ledger.catalog().get_product("p-rice").await.unwrap();
        assert_eq!(rice.stock, 15);
        assert_eq!(rice.sales_price, Money::from_minor(8250));
        assert_eq!(rice.purchase_price, Money::from_major(71));
        assert_eq!(rice.category, "Grains");

        let products = ledger.catalog().list_products().await.unwrap();
        assert_eq!(products.len(), 3);
        let sugar = products.iter().find(|p| p.name == "Sugar").unwrap();
        assert_eq!(sugar.unit, "kg");
        assert_eq!(sugar.sales_price, Money::from_major(1200));
        assert_eq!(sugar.stock, 25);
    }

    #[tokio::test]
    async fn test_import_bad_cell_rejects_everything() {
        let ledger = stocked_ledger().await;
        let sheet = "Name,Price,Stock\nRice,80,2\nSugar,abc,1\n";

        let err = ledger.transfer().import_products(sheet).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ledger.catalog().get_product("p-rice").await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_import_negative_values_reject_everything() {
        let ledger = stocked_ledger().await;
        let before = ledger.catalog().list_products().await.unwrap();
        let sheet = "Name,Price,Cost,Stock\nRice,-80,-70,-9\nGhee,-5,-1,-3\n";

        let err = ledger.transfer().import_products(sheet).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ledger.catalog().list_products().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_export_then_import_products_is_stable() {
        let ledger = stocked_ledger().await;

        let sheets = ledger.transfer().export_workbook().await.unwrap();
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Products", "Sales", "Purchases", "Expenses", "Staff"]);

        let products_csv = &sheets[0].csv;
        assert!(products_csv.starts_with("Id,Name,Category,Unit,Purchase Price,Sales Price,Stock"));

        // Re-importing the same sheet doubles stock (it is a quantity delta)
        let summary = ledger.transfer().import_products(products_csv).await.unwrap();
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.created, 0);
        assert_eq!(ledger.catalog().get_product("p-rice").await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_sales_sheet_restores_into_fresh_store() {
        let source = stocked_ledger().await;
        let rice = source.catalog().get_product("p-rice").await.unwrap();
        let sale = source
            .sales()
            .checkout(Checkout {
                cart: vec![CartLine::from_product(&rice, 2)],
                customer: "Anita".to_string(),
                gst_rate_percent: Some(5.0),
                mode: PaymentMode::Upi,
                ..Checkout::default()
            })
            .await
            .unwrap();

        let sheets = source.transfer().export_workbook().await.unwrap();
        let sales_csv = &sheets[1].csv;
        assert!(sales_csv.contains("Rice x 2 @ 80.00"));

        let target = ledger().await;
        assert_eq!(target.transfer().restore_sales(sales_csv).await.unwrap(), 1);
        assert_eq!(target.sales().list_sales().await.unwrap(), vec![sale]);
        assert_eq!(target.sales().next_bill_number().await.unwrap(), 2);

        // Second restore is a no-op
        assert_eq!(target.transfer().restore_sales(sales_csv).await.unwrap(), 0);
    }
}
