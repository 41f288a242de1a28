//! Error types for ledgerbook core.

use ledgerbook_ledger::LedgerError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while serving an invocation.
///
/// Every error is terminal for the invocation that raised it. Writes made
/// before the failure are not rolled back.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The ledger could not serve a request.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[from] LedgerError),

    /// A record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The invoked function does not exist.
    #[error("unknown function: {function}")]
    UnknownFunction {
        /// The requested function name.
        function: String,
    },

    /// Wrong number of arguments for a function.
    #[error("incorrect number of arguments for {function}: expected {expected}, got {actual}")]
    InvalidArgumentCount {
        /// The invoked function.
        function: String,
        /// Arguments the function takes.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },

    /// A field value is malformed (empty, non-numeric, out of range).
    #[error("invalid value for {field}: {message}")]
    InvalidFieldValue {
        /// The field being validated.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A record already exists at the key.
    #[error("record already exists: {key}")]
    AlreadyExists {
        /// The primary key.
        key: String,
    },

    /// No record exists at the key.
    #[error("record not found: {key}")]
    NotFound {
        /// The primary key.
        key: String,
    },

    /// The source balance of a transfer does not exist.
    #[error("source balance not found: {key}")]
    SourceNotFound {
        /// The source balance key.
        key: String,
    },

    /// A category outside the fixed set was named.
    #[error("invalid category: {name}")]
    InvalidCategory {
        /// The rejected category name.
        name: String,
    },

    /// A domain rule was violated.
    #[error("domain constraint violated: {message}")]
    DomainConstraint {
        /// Which rule and how.
        message: String,
    },

    /// A composite key could not be built.
    #[error("key encoding error: {message}")]
    Encoding {
        /// Why encoding failed.
        message: String,
    },

    /// A composite key could not be parsed.
    #[error("key decoding error: {message}")]
    Decoding {
        /// Why decoding failed.
        message: String,
    },

    /// The ledger has no history for the key.
    #[error("history unavailable for {key}: {reason}")]
    HistoryUnavailable {
        /// The primary key.
        key: String,
        /// Why no history could be produced.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid argument count error.
    pub fn invalid_argument_count(
        function: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        Self::InvalidArgumentCount {
            function: function.into(),
            expected,
            actual,
        }
    }

    /// Creates an invalid field value error.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Creates a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a domain constraint error.
    pub fn domain_constraint(message: impl Into<String>) -> Self {
        Self::DomainConstraint {
            message: message.into(),
        }
    }

    /// Creates a key encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a key decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Creates a history unavailable error.
    pub fn history_unavailable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HistoryUnavailable {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
