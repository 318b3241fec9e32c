//! # Ledger Error Type
//!
//! What every service operation returns on failure.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Ledger                             │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  │                                      │
//! │  sqlx / serde_json ──► DbError ──┼──► LedgerError ──► kind() ──► caller │
//! │                                  │                                      │
//! │  toml / io / csv ────────────────┘                                      │
//! │                                                                         │
//! │  ErrorKind            Caller reaction                                   │
//! │  ─────────            ───────────────                                   │
//! │  Validation           show the field message, keep the form            │
//! │  InsufficientStock    keep the cart, name the product                  │
//! │  NotFound             refresh the listing                              │
//! │  Persistence          operation abandoned, nothing was written         │
//! │  Internal             report and abandon                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried automatically.

use serde::Serialize;
use thiserror::Error;

use kirana_core::CoreError;
use kirana_db::DbError;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by ledger services.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =========================================================================
    // Domain
    // =========================================================================
    /// Business rule violation or missing record.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Store
    // =========================================================================
    /// Document store failure. The operation wrote nothing.
    #[error("Storage error: {0}")]
    Db(#[from] DbError),

    // =========================================================================
    // Configuration
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be written.
    #[error("Failed to save config: {0}")]
    ConfigSave(String),

    // =========================================================================
    // Files & Tabular Data
    // =========================================================================
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input or failed CSV output.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A cell that should carry JSON (e.g. `itemsJson`) did not decode.
    #[error("Invalid data in {context}: {reason}")]
    InvalidData { context: String, reason: String },
}

/// Error taxonomy exposed to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing or malformed input.
    Validation,

    /// Requested quantity exceeds live stock.
    InsufficientStock,

    /// Reference to a nonexistent product, sale, staff member or expense.
    NotFound,

    /// The store was unavailable or rejected the write.
    Persistence,

    /// Anything else.
    Internal,
}

impl LedgerError {
    /// Classifies this error for display.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Core(CoreError::InsufficientStock { .. }) => ErrorKind::InsufficientStock,
            LedgerError::Core(err) if err.is_not_found() => ErrorKind::NotFound,
            LedgerError::Core(_) => ErrorKind::Validation,

            LedgerError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            LedgerError::Db(_) => ErrorKind::Persistence,

            LedgerError::InvalidConfig(_)
            | LedgerError::ConfigParse(_)
            | LedgerError::Csv(_)
            | LedgerError::InvalidData { .. } => ErrorKind::Validation,

            LedgerError::Io(_) | LedgerError::ConfigSave(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid_data(context: impl Into<String>, reason: impl ToString) -> Self {
        LedgerError::InvalidData {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<kirana_core::ValidationError> for LedgerError {
    fn from(err: kirana_core::ValidationError) -> Self {
        LedgerError::Core(CoreError::Validation(err))
    }
}

impl From<toml::ser::Error> for LedgerError {
    fn from(err: toml::ser::Error) -> Self {
        LedgerError::ConfigSave(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_core::ValidationError;

    #[test]
    fn test_error_kinds() {
        let stock = LedgerError::from(CoreError::InsufficientStock {
            product: "Rice".to_string(),
            available: 5,
            requested: 6,
        });
        assert_eq!(stock.kind(), ErrorKind::InsufficientStock);

        let missing = LedgerError::from(CoreError::SaleNotFound("s-1".to_string()));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let invalid = LedgerError::from(ValidationError::Required {
            field: "name".to_string(),
        });
        assert_eq!(invalid.kind(), ErrorKind::Validation);

        let store = LedgerError::from(DbError::PoolExhausted);
        assert_eq!(store.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_core_message_is_passed_through() {
        let err = LedgerError::from(CoreError::EmptyCart);
        assert_eq!(err.to_string(), "Cart is empty");
    }
}
