//! # Command Error Type
//!
//! Unified error envelope for back-office commands.
//!
//! ```text
//! LedgerError ──► kind() ──┐
//! DbError ─────────────────┼──► CommandError { code, message } ──► stderr (JSON)
//! bad arguments ───────────┘
//! ```
//!
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Rice: ..." }
//! ```

use serde::Serialize;

use kirana_db::DbError;
use kirana_ledger::{ErrorKind, LedgerError};

/// Error printed when a command fails.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    /// Machine-readable error code
    pub code: ErrorKind,

    /// Human-readable error message
    pub message: String,
}

impl CommandError {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Bad command line.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<DbError> for CommandError {
    fn from(err: DbError) -> Self {
        LedgerError::from(err).into()
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("Failed to render output: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_core::CoreError;

    #[test]
    fn test_ledger_errors_keep_their_kind() {
        let err: CommandError = LedgerError::from(CoreError::SaleNotFound("s-1".into())).into();
        assert_eq!(err.code, ErrorKind::NotFound);
        assert!(err.message.contains("s-1"));
    }

    #[test]
    fn test_json_envelope() {
        let json = CommandError::usage("missing <date>").to_json();
        assert_eq!(json, r#"{"code":"VALIDATION","message":"missing <date>"}"#);
    }
}
