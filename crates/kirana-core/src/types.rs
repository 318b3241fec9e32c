//! # Domain Types
//!
//! Core domain entities for the Kirana Ledger.
//!
//! ## Entity Relationship
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Entities                                 │
//! │                                                                         │
//! │  ┌─────────────────┐         ┌─────────────────┐                       │
//! │  │    Product      │◄────────│    SaleItem     │ (price snapshot)      │
//! │  │  ─────────────  │         │  ─────────────  │                       │
//! │  │  id (UUID)      │         │  product_id     │                       │
//! │  │  name           │         │  name, unit     │                       │
//! │  │  sales_price    │         │  price, qty     │                       │
//! │  │  purchase_price │         └────────┬────────┘                       │
//! │  │  stock          │                  │ N:1                            │
//! │  └────────▲────────┘         ┌────────▼────────┐                       │
//! │           │                  │      Sale       │                       │
//! │           │                  │  bill_no, date  │                       │
//! │  ┌────────┴────────┐         │  subtotal, tax  │                       │
//! │  │  PurchaseItem   │         │  total, mode    │                       │
//! │  │  quantity       │         └─────────────────┘                       │
//! │  │  purchase_price │                                                    │
//! │  └────────┬────────┘         ┌─────────────────┐  ┌────────────────┐   │
//! │           │ N:1              │     Staff       │  │   DailyLog     │   │
//! │  ┌────────▼────────┐         │  salary         │  │  date          │   │
//! │  │    Purchase     │         │  attendance     │  │  opening bal.  │   │
//! │  │  supplier, date │         │  payments       │  └────────────────┘   │
//! │  └─────────────────┘         │  financials     │  ┌────────────────┐   │
//! │                              └─────────────────┘  │   Expense      │   │
//! │                                                   └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Document Shape
//! Every type here is stored inside a JSON collection document, so field
//! names are serialized in camelCase (`salesPrice`, `billNo`, `paidDate`) to
//! stay compatible with the presentation layer and exported workbooks.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_UNIT;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5% (the common GST slab for packaged staples)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (settings store GST as a percent).
    ///
    /// Negative or non-finite input collapses to zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return TaxRate(0);
        }
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

/// A catalog product.
///
/// `stock` is only ever changed through the [`crate::stock`] tracker; catalog
/// edits touch everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, also the natural key for tabular imports.
    pub name: String,

    #[serde(default)]
    pub category: String,

    /// Selling unit ("kg", "pcs", "ltr").
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Current cost basis. Overwritten by the latest purchase.
    #[serde(default)]
    pub purchase_price: Money,

    /// Current shelf price. Snapshotted into each sale line.
    #[serde(default)]
    pub sales_price: Money,

    /// On-hand quantity. May go negative; see the stock tracker.
    #[serde(default)]
    pub stock: i64,
}

impl Product {
    /// Case-insensitive name comparison used by imports and duplicate checks.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Margin per unit at current catalog prices.
    pub fn unit_margin(&self) -> Money {
        self.sales_price - self.purchase_price
    }

    /// True when the shelf is empty or oversold.
    pub fn is_out_of_stock(&self) -> bool {
        self.stock <= 0
    }
}

// =============================================================================
// Sales
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMode {
    Cash,
    Upi,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
        }
    }
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            other => Err(format!("unknown payment mode '{}'", other)),
        }
    }
}

/// A line on a committed sale.
///
/// `price` is the catalog sales price **at checkout** and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub product_id: String,
    pub name: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub price: Money,
    pub qty: i64,
}

impl SaleItem {
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.qty)
    }
}

/// A committed sale.
///
/// ## Lifecycle
/// ```text
/// Draft(cart) ──commit──► Committed ──reverse──► Reversed (deleted)
///      ▲                       │
///      └──── reverse as edit ──┘   (bill_no carried forward)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-facing sequential bill number.
    pub bill_no: u64,

    /// Checkout time, local wall clock.
    #[serde(with = "sale_timestamp")]
    #[ts(as = "String")]
    pub date: NaiveDateTime,

    pub items: Vec<SaleItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub mode: PaymentMode,

    #[serde(default)]
    pub customer: String,

    #[serde(default)]
    pub staff_id: Option<String>,
}

impl Sale {
    /// True when the sale happened on the given local calendar day.
    pub fn occurred_on(&self, date: NaiveDate) -> bool {
        self.date.date() == date
    }

    /// Free-text match on bill number substring or customer name,
    /// case-insensitive. An empty query matches everything.
    pub fn matches_filter(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.bill_no.to_string().contains(&query) || self.customer.to_lowercase().contains(&query)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| item.qty).sum()
    }
}

/// Serde adapter for sale timestamps.
///
/// Writes ISO-8601 with milliseconds and a `Z` suffix over the **local** wall
/// time (`2024-03-05T18:42:10.123Z`), so the calendar-day prefix of the stored
/// string is the shop's local day. Reads that form, any RFC 3339 timestamp,
/// or a bare date.
pub mod sale_timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn format(value: &NaiveDateTime) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let trimmed = raw.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.naive_local());
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid sale timestamp '{}'", raw)))
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// A line on a purchase, with the product name snapshotted at entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub purchase_price: Money,
}

impl PurchaseItem {
    pub fn line_total(&self) -> Money {
        self.purchase_price.multiply_quantity(self.quantity)
    }
}

/// A stock purchase from a supplier. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub supplier: String,
    pub items: Vec<PurchaseItem>,
    pub total_amount: Money,
    #[serde(default)]
    pub notes: String,
}

// =============================================================================
// Expenses
// =============================================================================

/// A non-stock expense (rent, electricity, tea).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expense {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub amount: Money,
}

// =============================================================================
// Staff & Payroll State
// =============================================================================

/// Attendance for one staff member on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AttendanceStatus {
    Present,
    #[serde(rename = "halfday")]
    HalfDay,
    Absent,
}

impl AttendanceStatus {
    /// Contribution to monthly attendance in half-day units.
    pub const fn half_days(&self) -> i64 {
        match self {
            AttendanceStatus::Present => 2,
            AttendanceStatus::HalfDay => 1,
            AttendanceStatus::Absent => 0,
        }
    }

    /// Lenient parse used when migrating stored documents: anything that is
    /// not a known status counts as absent.
    pub fn from_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "present" => AttendanceStatus::Present,
            "halfday" | "half-day" | "half_day" => AttendanceStatus::HalfDay,
            _ => AttendanceStatus::Absent,
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "halfday" | "half-day" => Ok(AttendanceStatus::HalfDay),
            "absent" => Ok(AttendanceStatus::Absent),
            other => Err(format!("unknown attendance status '{}'", other)),
        }
    }
}

/// One attendance entry, keyed by date within a staff record.
///
/// Older documents stored `{date, present: true}` without a status string.
/// Those are migrated to the closed enum once, while the document is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(from = "RawAttendanceRecord")]
#[ts(export)]
pub struct AttendanceRecord {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Deserialize)]
struct RawAttendanceRecord {
    date: NaiveDate,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    present: Option<bool>,
}

impl From<RawAttendanceRecord> for AttendanceRecord {
    fn from(raw: RawAttendanceRecord) -> Self {
        let status = match (raw.status.as_deref(), raw.present) {
            (Some(status), _) => AttendanceStatus::from_loose(status),
            (None, Some(true)) => AttendanceStatus::Present,
            (None, _) => AttendanceStatus::Absent,
        };
        AttendanceRecord {
            date: raw.date,
            status,
        }
    }
}

/// Salary payment for one (month, year) period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalaryPayment {
    /// Calendar month, 1-12.
    pub month: u32,
    pub year: i32,
    pub amount: Money,
    pub paid: bool,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub paid_date: Option<NaiveDate>,
}

impl SalaryPayment {
    /// True when this payment was disbursed on `date`.
    pub fn paid_on(&self, date: NaiveDate) -> bool {
        self.paid && self.paid_date == Some(date)
    }
}

/// Kind of informational staff money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum FinancialRecordType {
    Bonus,
    Advance,
    Return,
}

impl std::str::FromStr for FinancialRecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bonus" => Ok(FinancialRecordType::Bonus),
            "advance" => Ok(FinancialRecordType::Advance),
            "return" => Ok(FinancialRecordType::Return),
            other => Err(format!("unknown financial record type '{}'", other)),
        }
    }
}

/// Append-only staff money history. Never folded into payroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinancialRecord {
    #[serde(rename = "type")]
    pub kind: FinancialRecordType,
    pub amount: Money,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

/// A staff member with payroll state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: String,

    /// Monthly salary. Zero means unpaid / not on payroll.
    #[serde(default)]
    pub salary: Money,

    #[serde(default)]
    pub attendance_records: Vec<AttendanceRecord>,
    #[serde(default)]
    pub salary_payments: Vec<SalaryPayment>,
    #[serde(default)]
    pub financial_records: Vec<FinancialRecord>,
}

impl Staff {
    /// Looks up the payment recorded for a period.
    pub fn payment_for(&self, month: u32, year: i32) -> Option<&SalaryPayment> {
        self.salary_payments
            .iter()
            .find(|p| p.month == month && p.year == year)
    }

    /// Attendance records falling in a calendar month.
    pub fn attendance_in(&self, month: u32, year: i32) -> impl Iterator<Item = &AttendanceRecord> {
        self.attendance_records
            .iter()
            .filter(move |r| r.date.month() == month && r.date.year() == year)
    }
}

// =============================================================================
// Daily Log & Settings
// =============================================================================

/// Manually entered opening cash for a day. One per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyLog {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub opening_balance: Money,
}

/// Shop-level settings singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Settings {
    pub shop_name: String,
    /// Flat GST percentage applied at checkout.
    pub gst_rate_percent: f64,
    pub address: String,
    pub phone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            shop_name: "My Kirana Store".to_string(),
            gst_rate_percent: 0.0,
            address: String::new(),
            phone: String::new(),
        }
    }
}

impl Settings {
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_percentage(self.gst_rate_percent)
    }
}

// =============================================================================
// Inputs
// =============================================================================
// Request shapes handed in by the presentation layer. Validated in
// `crate::validation` before any collection is touched.

/// New catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub unit: Option<String>,
    pub purchase_price: Money,
    pub sales_price: Money,
    pub initial_stock: i64,
}

/// Catalog edit. `None` leaves the field untouched. Stock is not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub purchase_price: Option<Money>,
    pub sales_price: Option<Money>,
}

/// New expense entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub amount: Money,
}

/// New staff member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub name: String,
    pub phone: String,
    pub role: String,
    pub salary: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
