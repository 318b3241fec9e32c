//! # kirana-db: Document Store for the Kirana Ledger
//!
//! This crate provides persistence for the ledger. Each named collection is
//! one JSON document in SQLite, accessed with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Kirana Ledger Data Flow                           │
//! │                                                                         │
//! │  Ledger service (checkout)                                             │
//! │       │  snapshot() ─► core::commit_sale() ─► commit(ChangeSet)        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    kirana-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Document      │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  Repository    │   │  (embedded)  │  │   │
//! │  │   │               │    │                │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ get / replace  │   │ 001_initial  │  │   │
//! │  │   │ WAL, NORMAL   │    │ commit (tx)    │   │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │     SQLite: documents(collection, payload, version, updated_at) │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The collection document repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kirana_core::{ChangeSet, Collection, Product};
//! use kirana_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kirana.db")).await?;
//!
//! let products: Vec<Product> = db.documents().get(Collection::Products).await?;
//! db.documents().commit(&ChangeSet::new().with_products(products)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::document::{DocumentRepository, StoreSnapshot};
