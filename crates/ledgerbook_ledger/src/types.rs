//! Value types exchanged with the ledger.

use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

/// Identifier of the ledger transaction that produced a write.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(pub String);

impl TxId {
    /// Creates a transaction ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commit timestamp of a ledger transaction (Unix seconds + nanoseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second nanoseconds, always below 1_000_000_000.
    pub nanos: u32,
}

impl Timestamp {
    /// Creates a timestamp from Unix seconds and nanoseconds.
    #[must_use]
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Creates a timestamp on a whole second.
    #[must_use]
    pub const fn from_secs(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Returns the timestamp advanced by `seconds`, saturating at the
    /// bounds of `i64`.
    #[must_use]
    pub const fn plus_secs(self, seconds: i64) -> Self {
        Self {
            seconds: self.seconds.saturating_add(seconds),
            nanos: self.nanos,
        }
    }

    fn to_datetime(self) -> Option<OffsetDateTime> {
        let total = i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanos);
        OffsetDateTime::from_unix_timestamp_nanos(total).ok()
    }

    /// Formats the timestamp as RFC 3339 in UTC.
    ///
    /// Timestamps outside the representable calendar range fall back to
    /// `seconds.nanos`.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        self.to_datetime()
            .and_then(|dt| dt.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.raw())
    }

    /// Formats the timestamp to whole-second precision, `YYYY-MM-DDTHH:MM:SS`.
    #[must_use]
    pub fn to_second_precision(self) -> String {
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
        self.to_datetime()
            .and_then(|dt| dt.format(&format).ok())
            .unwrap_or_else(|| self.raw())
    }

    fn raw(self) -> String {
        format!("{}.{:09}", self.seconds, self.nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

/// A key and its current value, as produced by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The ledger key.
    pub key: String,
    /// The stored bytes.
    pub value: Vec<u8>,
}

/// One entry of a key's change history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Transaction that wrote this version.
    pub tx_id: TxId,
    /// Written value, or `None` for a deletion.
    pub value: Option<Vec<u8>>,
    /// Commit timestamp of the transaction.
    pub timestamp: Timestamp,
}

impl HistoryRecord {
    /// Returns true if this entry records a deletion.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}
