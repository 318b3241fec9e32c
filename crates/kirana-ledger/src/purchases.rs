//! # Purchase Transaction Manager
//!
//! Stock received from suppliers. Append-only: purchases have no reversal.

use chrono::NaiveDate;
use tracing::info;

use crate::error::LedgerResult;
use crate::Ledger;
use kirana_core::purchase::{self, PurchaseRequest};
use kirana_core::{ChangeSet, Collection, Purchase};

/// Purchase operations bound to a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct PurchaseManager<'a> {
    ledger: &'a Ledger,
}

impl<'a> PurchaseManager<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        PurchaseManager { ledger }
    }

    /// Commits a purchase: appends the record, adds every quantity to stock
    /// and overwrites each product's cost basis with the purchase price.
    ///
    /// ## Errors
    /// - `InvalidPurchase` for no items or a non-positive quantity/price
    /// - `ProductNotFound` for an unknown product id
    pub async fn commit(&self, request: PurchaseRequest) -> LedgerResult<Purchase> {
        let _guard = self.ledger.lock_writes().await;
        let mut snapshot = self.ledger.snapshot().await?;

        let purchase = purchase::commit_purchase(
            &mut snapshot.products,
            &mut snapshot.purchases,
            request,
            self.ledger.new_id(),
        )?;

        self.ledger
            .commit(
                ChangeSet::new()
                    .with_products(snapshot.products)
                    .with_purchases(snapshot.purchases),
            )
            .await?;

        info!(
            purchase_id = %purchase.id,
            supplier = %purchase.supplier,
            items = purchase.items.len(),
            total = %purchase.total_amount,
            "Purchase committed"
        );
        Ok(purchase)
    }

    pub async fn list_purchases(&self) -> LedgerResult<Vec<Purchase>> {
        Ok(self
            .ledger
            .database()
            .documents()
            .get(Collection::Purchases)
            .await?)
    }

    /// Purchases dated `date`.
    pub async fn purchases_on(&self, date: NaiveDate) -> LedgerResult<Vec<Purchase>> {
        Ok(self
            .list_purchases()
            .await?
            .into_iter()
            .filter(|p| p.date == date)
            .collect())
    }
}
