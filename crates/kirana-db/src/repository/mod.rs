//! # Repository Module
//!
//! Store access for the ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Ledger service                                                        │
//! │       │  db.documents().commit(&change_set)                            │
//! │       ▼                                                                 │
//! │  DocumentRepository                                                    │
//! │  ├── get(collection)          missing → Default                        │
//! │  ├── replace(collection, v)   whole-document write                     │
//! │  ├── commit(change_set)       many documents, one transaction          │
//! │  └── snapshot()               every collection, decoded                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite `documents` table                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod document;
