//! Error types for ledger operations.

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur while talking to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The ledger could not serve the request.
    #[error("ledger unavailable: {reason}")]
    Unavailable {
        /// Why the request failed.
        reason: String,
    },

    /// The key is not acceptable to the ledger.
    #[error("invalid ledger key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An empty value was written. Ledgers treat empty values as deletion,
    /// so writes must carry at least one byte.
    #[error("empty value written to key {key:?}")]
    EmptyValue {
        /// The key being written.
        key: String,
    },
}

impl LedgerError {
    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
