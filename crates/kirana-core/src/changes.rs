//! # Change Sets
//!
//! The transactional command object for the document store.
//!
//! A service gathers every collection an operation touched into one
//! [`ChangeSet`] and hands it to the store, which writes all of them or none.
//!
//! ```text
//! checkout:   ChangeSet { products, sales, last_bill_number }
//! reversal:   ChangeSet { products, sales }
//! purchase:   ChangeSet { products, purchases }
//! payroll:    ChangeSet { staff }
//! ```

use serde::Serialize;

use crate::types::{DailyLog, Expense, Product, Purchase, Sale, Settings, Staff};

// =============================================================================
// Collection Names
// =============================================================================

/// A named collection in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Settings,
    Products,
    Staff,
    Sales,
    Purchases,
    Expenses,
    DailyLogs,
    LastBillNumber,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Settings,
        Collection::Products,
        Collection::Staff,
        Collection::Sales,
        Collection::Purchases,
        Collection::Expenses,
        Collection::DailyLogs,
        Collection::LastBillNumber,
    ];

    /// Storage key.
    pub const fn name(&self) -> &'static str {
        match self {
            Collection::Settings => "settings",
            Collection::Products => "products",
            Collection::Staff => "staff",
            Collection::Sales => "sales",
            Collection::Purchases => "purchases",
            Collection::Expenses => "expenses",
            Collection::DailyLogs => "daily_logs",
            Collection::LastBillNumber => "last_bill_number",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Change Set
// =============================================================================

/// Full replacement values for the collections an operation changed.
///
/// `None` means "not touched". Collections are always written whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub settings: Option<Settings>,
    pub products: Option<Vec<Product>>,
    pub staff: Option<Vec<Staff>>,
    pub sales: Option<Vec<Sale>>,
    pub purchases: Option<Vec<Purchase>>,
    pub expenses: Option<Vec<Expense>>,
    pub daily_logs: Option<Vec<DailyLog>>,
    pub last_bill_number: Option<u64>,
}

impl ChangeSet {
    pub fn new() -> Self {
        ChangeSet::default()
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn with_staff(mut self, staff: Vec<Staff>) -> Self {
        self.staff = Some(staff);
        self
    }

    pub fn with_sales(mut self, sales: Vec<Sale>) -> Self {
        self.sales = Some(sales);
        self
    }

    pub fn with_purchases(mut self, purchases: Vec<Purchase>) -> Self {
        self.purchases = Some(purchases);
        self
    }

    pub fn with_expenses(mut self, expenses: Vec<Expense>) -> Self {
        self.expenses = Some(expenses);
        self
    }

    pub fn with_daily_logs(mut self, daily_logs: Vec<DailyLog>) -> Self {
        self.daily_logs = Some(daily_logs);
        self
    }

    pub fn with_last_bill_number(mut self, last: u64) -> Self {
        self.last_bill_number = Some(last);
        self
    }

    /// True when nothing would be written.
    pub fn is_empty(&self) -> bool {
        self.collections().is_empty()
    }

    /// Collections this change set writes, in a stable order.
    pub fn collections(&self) -> Vec<Collection> {
        let mut touched = Vec::new();
        if self.settings.is_some() {
            touched.push(Collection::Settings);
        }
        if self.products.is_some() {
            touched.push(Collection::Products);
        }
        if self.staff.is_some() {
            touched.push(Collection::Staff);
        }
        if self.sales.is_some() {
            touched.push(Collection::Sales);
        }
        if self.purchases.is_some() {
            touched.push(Collection::Purchases);
        }
        if self.expenses.is_some() {
            touched.push(Collection::Expenses);
        }
        if self.daily_logs.is_some() {
            touched.push(Collection::DailyLogs);
        }
        if self.last_bill_number.is_some() {
            touched.push(Collection::LastBillNumber);
        }
        touched
    }

    /// Serializes every touched collection to its JSON document.
    pub fn to_documents(&self) -> Result<Vec<(Collection, String)>, serde_json::Error> {
        fn doc<T: Serialize>(
            out: &mut Vec<(Collection, String)>,
            collection: Collection,
            value: &Option<T>,
        ) -> Result<(), serde_json::Error> {
            if let Some(value) = value {
                out.push((collection, serde_json::to_string(value)?));
            }
            Ok(())
        }

        let mut out = Vec::new();
        doc(&mut out, Collection::Settings, &self.settings)?;
        doc(&mut out, Collection::Products, &self.products)?;
        doc(&mut out, Collection::Staff, &self.staff)?;
        doc(&mut out, Collection::Sales, &self.sales)?;
        doc(&mut out, Collection::Purchases, &self.purchases)?;
        doc(&mut out, Collection::Expenses, &self.expenses)?;
        doc(&mut out, Collection::DailyLogs, &self.daily_logs)?;
        doc(&mut out, Collection::LastBillNumber, &self.last_bill_number)?;
        Ok(out)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_are_unique() {
        let mut names: Vec<&str> = Collection::ALL.iter().map(Collection::name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Collection::ALL.len());
        assert_eq!(Collection::DailyLogs.to_string(), "daily_logs");
    }

    #[test]
    fn test_change_set_tracks_touched_collections() {
        let empty = ChangeSet::new();
        assert!(empty.is_empty());

        let checkout = ChangeSet::new()
            .with_products(vec![])
            .with_sales(vec![])
            .with_last_bill_number(7);
        assert_eq!(
            checkout.collections(),
            vec![
                Collection::Products,
                Collection::Sales,
                Collection::LastBillNumber
            ]
        );

        let docs = checkout.to_documents().unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[2], (Collection::LastBillNumber, "7".to_string()));
    }
}
