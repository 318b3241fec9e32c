//! # Product Import Mapping
//!
//! Turns spreadsheet rows into catalog upserts. Reading the file itself is
//! the ledger's job; this module only knows headers, cells and products.
//!
//! ## Accepted Headers
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────┐
//! │ Field            │ Header aliases                               │
//! ├──────────────────┼──────────────────────────────────────────────┤
//! │ name             │ Name, name, Product, product                 │
//! │ category         │ Category, category                           │
//! │ sales price      │ Price, price, Sales Price, SalesPrice        │
//! │ purchase price   │ Purchase Price, PurchasePrice, Cost          │
//! │ stock            │ Stock, stock, Qty, Quantity                  │
//! │ unit             │ Unit, unit                                   │
//! └──────────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! ## Upsert Rule
//! Rows match existing products by case-insensitive name. A match gets its
//! stock **increased** by the row's quantity and its prices/category
//! overwritten where the row supplies them. Anything else becomes a new
//! product with unit `pcs` unless the row names one.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::stock;
use crate::types::Product;
use crate::validation::{validate_price, validate_product_name};
use crate::DEFAULT_UNIT;

// =============================================================================
// Columns
// =============================================================================

/// A recognised import column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportColumn {
    Name,
    Category,
    SalesPrice,
    PurchasePrice,
    Stock,
    Unit,
}

impl ImportColumn {
    /// Maps a header cell to a column; unknown headers are ignored.
    pub fn from_header(header: &str) -> Option<Self> {
        match header.trim() {
            "Name" | "name" | "Product" | "product" => Some(ImportColumn::Name),
            "Category" | "category" => Some(ImportColumn::Category),
            "Price" | "price" | "Sales Price" | "SalesPrice" => Some(ImportColumn::SalesPrice),
            "Purchase Price" | "PurchasePrice" | "Cost" => Some(ImportColumn::PurchasePrice),
            "Stock" | "stock" | "Qty" | "Quantity" => Some(ImportColumn::Stock),
            "Unit" | "unit" => Some(ImportColumn::Unit),
            _ => None,
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// One parsed spreadsheet row. Absent cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    pub name: String,
    pub category: Option<String>,
    pub sales_price: Option<Money>,
    pub purchase_price: Option<Money>,
    pub stock: Option<i64>,
    pub unit: Option<String>,
}

impl ImportRow {
    /// Builds a row from a header line and a record.
    ///
    /// Returns `Ok(None)` when the row has no name (blank spreadsheet lines,
    /// totals rows); those are skipped rather than rejected.
    pub fn from_cells(headers: &[String], cells: &[String]) -> Result<Option<Self>, ValidationError> {
        let mut row = ImportRow::default();

        for (header, cell) in headers.iter().zip(cells.iter()) {
            let value = cell.trim();
            if value.is_empty() {
                continue;
            }
            match ImportColumn::from_header(header) {
                Some(ImportColumn::Name) => row.name = value.to_string(),
                Some(ImportColumn::Category) => row.category = Some(value.to_string()),
                Some(ImportColumn::SalesPrice) => row.sales_price = Some(Money::parse_decimal(value)?),
                Some(ImportColumn::PurchasePrice) => {
                    row.purchase_price = Some(Money::parse_decimal(value)?)
                }
                Some(ImportColumn::Stock) => row.stock = Some(parse_quantity(value)?),
                Some(ImportColumn::Unit) => row.unit = Some(value.to_string()),
                None => {}
            }
        }

        if row.name.is_empty() {
            return Ok(None);
        }
        row.validate()?;
        Ok(Some(row))
    }

    /// Same rules the catalog applies to hand-entered products.
    fn validate(&self) -> Result<(), ValidationError> {
        validate_product_name(&self.name)?;
        if let Some(price) = self.sales_price {
            validate_price("sales_price", price)?;
        }
        if let Some(price) = self.purchase_price {
            validate_price("purchase_price", price)?;
        }
        match self.stock {
            Some(stock) if stock < 0 => Err(ValidationError::OutOfRange {
                field: "stock".to_string(),
                min: 0,
                max: i64::MAX,
            }),
            _ => Ok(()),
        }
    }
}

/// Whole-number quantity; spreadsheets often write `12` as `12.0`.
fn parse_quantity(raw: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "stock".to_string(),
        reason: format!("'{}' is not a whole number", raw),
    };

    let cleaned = raw.replace(',', "");
    if let Ok(qty) = cleaned.parse::<i64>() {
        return Ok(qty);
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        _ => Err(invalid()),
    }
}

// =============================================================================
// Upsert
// =============================================================================

/// Outcome counts of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Applies rows to the catalog.
///
/// `next_id` supplies ids for newly created products.
pub fn upsert_rows<F>(products: &mut Vec<Product>, rows: Vec<ImportRow>, mut next_id: F) -> CoreResult<ImportSummary>
where
    F: FnMut() -> String,
{
    let mut summary = ImportSummary::default();

    for row in rows {
        match products.iter().position(|p| p.name_matches(&row.name)) {
            Some(index) => {
                let id = products[index].id.clone();
                stock::adjust(products, &id, row.stock.unwrap_or(0))?;

                let product = &mut products[index];
                if let Some(price) = row.sales_price {
                    product.sales_price = price;
                }
                if let Some(cost) = row.purchase_price {
                    product.purchase_price = cost;
                }
                if let Some(category) = row.category {
                    product.category = category;
                }
                summary.updated += 1;
            }
            None => {
                products.push(Product {
                    id: next_id(),
                    name: row.name.trim().to_string(),
                    category: row.category.unwrap_or_default(),
                    unit: row.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
                    purchase_price: row.purchase_price.unwrap_or_default(),
                    sales_price: row.sales_price.unwrap_or_default(),
                    stock: row.stock.unwrap_or(0),
                });
                summary.created += 1;
            }
        }
    }

    Ok(summary)
}

// =============================================================================
// Unit Tests
// =============================================================================
