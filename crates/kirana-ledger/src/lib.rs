//! # kirana-ledger: Transaction & Inventory Ledger Services
//!
//! The entry points the presentation layer calls: checkout, sale reversal,
//! purchases, payroll, daily reports, catalog upkeep and tabular
//! import/export.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Every write operation                                  │
//! │                                                                         │
//! │  ledger.sales().checkout(input)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. write_lock.lock()       single writer, no interleaving             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. documents().snapshot()  products, sales, counter, ...              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. kirana_core::sale::commit_sale(&mut products, &mut sales, ...)     │
//! │       │   pure; on Err nothing below runs                              │
//! │       ▼                                                                 │
//! │  4. documents().commit(ChangeSet{products, sales, last_bill_number})   │
//! │       │   one SQLite transaction                                       │
//! │       ▼                                                                 │
//! │  5. guard dropped, Sale returned                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads (reports, listings) skip the lock and see the last committed state.
//!
//! ## Module Organization
//! - [`sales`] - Checkout, reversal, edit drafts
//! - [`purchases`] - Purchase commits
//! - [`payroll`] - Staff, attendance, salary
//! - [`reports`] - Daily report, report export, opening balances
//! - [`catalog`] - Product add/edit/delete, low stock
//! - [`expenses`] - Non-stock expenses
//! - [`transfer`] - CSV product import, workbook export, sales restore
//! - [`config`] - `ledger.toml` + environment
//! - [`error`] - `LedgerError` and its `ErrorKind`

pub mod catalog;
pub mod config;
pub mod error;
pub mod expenses;
pub mod payroll;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod transfer;

pub use catalog::Catalog;
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use expenses::Expenses;
pub use payroll::Payroll;
pub use purchases::PurchaseManager;
pub use reports::ReportService;
pub use sales::{Checkout, SaleManager};
pub use transfer::{Sheet, Transfer};

use chrono::{Local, NaiveDate, NaiveDateTime};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use kirana_core::{stock, validation, ChangeSet, Collection, Settings};
use kirana_db::{Database, StoreSnapshot};

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for sale timestamps and default dates.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// The machine's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant. Used by tests and backdated entry.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// The ledger: a store handle, the write guard, and a clock.
///
/// Created once at process start and passed to whoever needs it.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(config.db_config()).await?;
/// let ledger = Ledger::new(db);
///
/// let sale = ledger.sales().checkout(checkout).await?;
/// let report = ledger.reports().daily_report(today, None).await?;
/// ```
#[derive(Debug)]
pub struct Ledger {
    db: Database,
    write_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Creates a ledger over `db` using the system clock.
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Creates a ledger with an explicit clock.
    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Ledger {
            db,
            write_lock: Mutex::new(()),
            clock,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub fn sales(&self) -> SaleManager<'_> {
        SaleManager::new(self)
    }

    pub fn purchases(&self) -> PurchaseManager<'_> {
        PurchaseManager::new(self)
    }

    pub fn payroll(&self) -> Payroll<'_> {
        Payroll::new(self)
    }

    pub fn reports(&self) -> ReportService<'_> {
        ReportService::new(self)
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    pub fn expenses(&self) -> Expenses<'_> {
        Expenses::new(self)
    }

    pub fn transfer(&self) -> Transfer<'_> {
        Transfer::new(self)
    }

    // =========================================================================
    // Stock Tracker
    // =========================================================================

    /// Applies `stock += delta` to one product and persists the catalog.
    ///
    /// Does not reject a result below zero; checkout pre-checks availability
    /// itself.
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> LedgerResult<i64> {
        let _guard = self.lock_writes().await;

        let mut snapshot = self.snapshot().await?;
        let stock = stock::adjust(&mut snapshot.products, product_id, delta)?;

        self.commit(ChangeSet::new().with_products(snapshot.products))
            .await?;

        info!(product_id = %product_id, delta, stock, "Stock adjusted");
        Ok(stock)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Shop settings, defaults if never saved.
    pub async fn settings(&self) -> LedgerResult<Settings> {
        Ok(self.db.documents().get(Collection::Settings).await?)
    }

    /// Replaces the shop settings.
    pub async fn save_settings(&self, settings: Settings) -> LedgerResult<Settings> {
        validation::validate_gst_percent(settings.gst_rate_percent)?;
        validation::validate_required("shop_name", &settings.shop_name, validation::MAX_NAME_LEN)?;

        let _guard = self.lock_writes().await;
        self.commit(ChangeSet::new().with_settings(settings.clone()))
            .await?;

        info!(shop = %settings.shop_name, gst = settings.gst_rate_percent, "Settings saved");
        Ok(settings)
    }

    /// Writes settings from config defaults if the store has none yet.
    pub async fn ensure_settings(&self, config: &LedgerConfig) -> LedgerResult<Settings> {
        let _guard = self.lock_writes().await;

        if let Some(_existing) = self.db.documents().get_raw(Collection::Settings).await? {
            return self.settings().await;
        }

        let settings = Settings {
            shop_name: config.store.name.clone(),
            gst_rate_percent: config.store.default_gst_percent,
            ..Settings::default()
        };
        self.commit(ChangeSet::new().with_settings(settings.clone()))
            .await?;

        info!(shop = %settings.shop_name, "Initial settings written");
        Ok(settings)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub(crate) async fn snapshot(&self) -> LedgerResult<StoreSnapshot> {
        Ok(self.db.documents().snapshot().await?)
    }

    pub(crate) async fn commit(&self, changes: ChangeSet) -> LedgerResult<()> {
        debug!(collections = ?changes.collections(), "Committing");
        self.db.documents().commit(&changes).await?;
        Ok(())
    }

    pub(crate) fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

// =============================================================================
// Test Support
// =============================================================================
