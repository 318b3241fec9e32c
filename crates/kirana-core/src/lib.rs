//! # kirana-core: Pure Business Logic for the Kirana Ledger
//!
//! This crate is the **heart** of the ledger. It contains the transaction and
//! inventory rules as pure functions over in-memory collections, with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Kirana Ledger Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation (backoffice CLI / UI)              │   │
//! │  │    checkout, delete sale, add purchase, daily report           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                kirana-ledger (service layer)                    │   │
//! │  │    load collections ─► core mutation ─► atomic ChangeSet       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kirana-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  stock  │ │  sale   │ │ purchase │ │ payroll │ │ report │  │   │
//! │  │   │ adjust  │ │ commit  │ │ commit   │ │ payable │ │ daily  │  │   │
//! │  │   │ deltas  │ │ reverse │ │ cost     │ │ upserts │ │ P & L  │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kirana-db (Document Store)                      │   │
//! │  │          SQLite collections, migrations, atomic commits         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Purchase, Staff, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`stock`] - Inventory Stock Tracker
//! - [`sale`] - Sale totals, bill numbers, commit and reversal
//! - [`purchase`] - Purchase commit and cost-basis tracking
//! - [`payroll`] - Attendance days and pro-rated salary
//! - [`report`] - Daily financial and stock movement report
//! - [`import`] - Tabular product import upserts
//! - [`changes`] - The transactional command object handed to the store
//!
//! ## Example Usage
//!
//! ```rust
//! use kirana_core::money::Money;
//! use kirana_core::types::TaxRate;
//!
//! // 3 × 80.00 at 5% GST
//! let subtotal = Money::from_major(80) * 3_i64;
//! let rate = TaxRate::from_percentage(5.0);
//!
//! assert_eq!(subtotal.calculate_tax(rate), Money::from_major(12));
//! assert_eq!(subtotal.grand_total(rate), Money::from_major(252));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod changes;
pub mod error;
pub mod import;
pub mod money;
pub mod payroll;
pub mod purchase;
pub mod report;
pub mod sale;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kirana_core::Money` instead of
// `use kirana_core::money::Money`

pub use changes::{ChangeSet, Collection};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit assigned to products that arrive without one (catalog entry or import).
pub const DEFAULT_UNIT: &str = "pcs";

/// Maximum quantity of a single line in a cart or purchase.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 10000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 99_999;
