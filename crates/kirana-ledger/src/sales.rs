//! # Sale Transaction Manager
//!
//! Checkout, reversal and the edit cycle.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Draft(cart) ──checkout()──► Committed ──reverse()──► Reversed         │
//! │        ▲                          │                    (terminal)       │
//! │        │                          │                                     │
//! │        └──────── begin_edit() ────┘                                     │
//! │           (reversal + cart seeded from the sale; bill number is        │
//! │            carried into the next checkout as preserved_bill_no)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A committed sale is never mutated in place.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerResult;
use crate::Ledger;
use kirana_core::sale::{self, BillCounter, CartLine, CheckoutRequest, EditDraft, SaleTotals};
use kirana_core::validation::validate_gst_percent;
use kirana_core::{ChangeSet, Collection, CoreError, PaymentMode, Product, Sale, Settings, TaxRate};

/// A checkout as submitted by the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub cart: Vec<CartLine>,
    #[serde(default)]
    pub mode: PaymentMode,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub staff_id: Option<String>,
    /// Overrides the settings' GST rate for this checkout.
    #[serde(default)]
    pub gst_rate_percent: Option<f64>,
    /// Set when committing an edit draft.
    #[serde(default)]
    pub preserved_bill_no: Option<u64>,
}

impl From<EditDraft> for Checkout {
    fn from(draft: EditDraft) -> Self {
        Checkout {
            cart: draft.cart,
            mode: draft.mode,
            customer: draft.customer,
            staff_id: draft.staff_id,
            gst_rate_percent: None,
            preserved_bill_no: Some(draft.bill_no),
        }
    }
}

/// Sale operations bound to a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct SaleManager<'a> {
    ledger: &'a Ledger,
}

impl<'a> SaleManager<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        SaleManager { ledger }
    }

    /// Commits a checkout.
    ///
    /// ## Flow
    /// 1. Validate any explicit GST override
    /// 2. Under the write guard: re-read settings and the live catalog,
    ///    resolve the tax rate, check stock, allocate the bill number,
    ///    append the sale, decrement stock
    /// 3. Persist products, sales and the counter in one commit
    ///
    /// ## Errors
    /// - `EmptyCart`, `Validation` for bad input
    /// - `InsufficientStock` naming the first short product
    /// - `ProductNotFound` if a line's product was deleted
    ///
    /// On any error the store is unchanged.
    pub async fn checkout(&self, checkout: Checkout) -> LedgerResult<Sale> {
        if let Some(pct) = checkout.gst_rate_percent {
            validate_gst_percent(pct)?;
        }

        debug!(
            lines = checkout.cart.len(),
            mode = %checkout.mode.as_str(),
            preserved = ?checkout.preserved_bill_no,
            "Checkout requested"
        );

        let _guard = self.ledger.lock_writes().await;
        let mut snapshot = self.ledger.snapshot().await?;
        let mut counter = BillCounter::new(snapshot.last_bill_number);
        // Settings come from the same guarded snapshot as the catalog
        let tax_rate = resolve_tax_rate(&snapshot.settings, checkout.gst_rate_percent)?;

        let sale = sale::commit_sale(
            &mut snapshot.products,
            &mut snapshot.sales,
            &mut counter,
            CheckoutRequest {
                cart: checkout.cart,
                mode: checkout.mode,
                customer: checkout.customer,
                staff_id: checkout.staff_id,
                tax_rate,
                preserved_bill_no: checkout.preserved_bill_no,
            },
            self.ledger.new_id(),
            self.ledger.clock().now(),
        )?;

        self.ledger
            .commit(
                ChangeSet::new()
                    .with_products(snapshot.products)
                    .with_sales(snapshot.sales)
                    .with_last_bill_number(counter.last_issued()),
            )
            .await?;

        info!(
            sale_id = %sale.id,
            bill_no = sale.bill_no,
            total = %sale.total,
            mode = %sale.mode.as_str(),
            "Sale committed"
        );
        Ok(sale)
    }

    /// Deletes a sale and restores its quantities to stock.
    ///
    /// Lines whose product has since been removed from the catalog are
    /// skipped with a warning.
    pub async fn reverse(&self, sale_id: &str) -> LedgerResult<Sale> {
        let _guard = self.ledger.lock_writes().await;
        let (sale, _) = self.reverse_locked(sale_id).await?;
        Ok(sale)
    }

    /// Starts editing a sale: reverses it and returns a cart seeded from its
    /// items, carrying the original bill number.
    ///
    /// Commit the (possibly modified) draft with
    /// `checkout(Checkout::from(draft))`. Abandoning the draft leaves the
    /// sale deleted.
    pub async fn begin_edit(&self, sale_id: &str) -> LedgerResult<EditDraft> {
        let _guard = self.ledger.lock_writes().await;
        let (sale, products) = self.reverse_locked(sale_id).await?;

        let draft = EditDraft::from_reversed(&sale, &products);
        debug!(bill_no = draft.bill_no, lines = draft.cart.len(), "Edit draft created");
        Ok(draft)
    }

    /// All sales in commit order.
    pub async fn list_sales(&self) -> LedgerResult<Vec<Sale>> {
        Ok(self.ledger.database().documents().get(Collection::Sales).await?)
    }

    pub async fn get_sale(&self, sale_id: &str) -> LedgerResult<Sale> {
        self.list_sales()
            .await?
            .into_iter()
            .find(|s| s.id == sale_id)
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Bill number the next fresh checkout will receive. Does not advance
    /// the counter.
    pub async fn next_bill_number(&self) -> LedgerResult<u64> {
        let last: u64 = self
            .ledger
            .database()
            .documents()
            .get(Collection::LastBillNumber)
            .await?;
        Ok(BillCounter::new(last).peek_next())
    }

    /// Totals a cart would get at checkout, without committing anything.
    pub async fn preview_totals(
        &self,
        cart: &[CartLine],
        gst_rate_percent: Option<f64>,
    ) -> LedgerResult<SaleTotals> {
        let settings = self.ledger.settings().await?;
        let rate = resolve_tax_rate(&settings, gst_rate_percent)?;
        Ok(SaleTotals::compute(cart, rate))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Caller must hold the write guard.
    async fn reverse_locked(&self, sale_id: &str) -> LedgerResult<(Sale, Vec<Product>)> {
        let mut snapshot = self.ledger.snapshot().await?;
        let reversal = sale::reverse_sale(&mut snapshot.products, &mut snapshot.sales, sale_id)?;

        for product_id in &reversal.missing_products {
            warn!(
                sale_id = %sale_id,
                product_id = %product_id,
                "Product no longer in catalog, stock not restored"
            );
        }

        self.ledger
            .commit(
                ChangeSet::new()
                    .with_products(snapshot.products.clone())
                    .with_sales(snapshot.sales),
            )
            .await?;

        info!(
            sale_id = %reversal.sale.id,
            bill_no = reversal.sale.bill_no,
            "Sale reversed"
        );
        Ok((reversal.sale, snapshot.products))
    }
}

/// Explicit GST override, else the shop's configured rate.
fn resolve_tax_rate(settings: &Settings, override_percent: Option<f64>) -> LedgerResult<TaxRate> {
    match override_percent {
        Some(pct) => {
            validate_gst_percent(pct)?;
            Ok(TaxRate::from_percentage(pct))
        }
        None => Ok(settings.tax_rate()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
