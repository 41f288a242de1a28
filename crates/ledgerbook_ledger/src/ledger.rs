//! Ledger trait definition.

use crate::error::LedgerResult;
use crate::types::{HistoryRecord, KeyValue, Timestamp};

/// Iterator over the results of a range scan.
pub type RangeIter<'a> = Box<dyn Iterator<Item = LedgerResult<KeyValue>> + 'a>;

/// Iterator over a key's history, oldest first.
pub type HistoryIter<'a> = Box<dyn Iterator<Item = LedgerResult<HistoryRecord>> + 'a>;

/// An append-only key-value ledger.
///
/// Ledgers are **opaque byte stores** with memory: every write is kept in
/// the key's history. The record layer owns all interpretation of keys and
/// values.
///
/// # Invariants
///
/// - `get` returns the value of the last `put`, or `None` after `delete`
/// - `range_scan` yields keys in ascending byte order
/// - `history_of` yields entries in commit order and never re-sorts them
/// - Ledgers must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryLedger`] - For testing
pub trait Ledger: Send + Sync {
    /// Reads the current value of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key is empty
    /// - The value is empty
    /// - The write fails
    fn put(&mut self, key: &str, value: &[u8]) -> LedgerResult<()>;

    /// Deletes `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn delete(&mut self, key: &str) -> LedgerResult<()>;

    /// Scans keys in the half-open range `[start, end)`.
    ///
    /// An empty `end` leaves the range unbounded above.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan cannot be started. Individual items
    /// may also fail.
    fn range_scan(&self, start: &str, end: &str) -> LedgerResult<RangeIter<'_>>;

    /// Returns the change history of `key`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be produced.
    fn history_of(&self, key: &str) -> LedgerResult<HistoryIter<'_>>;

    /// Returns the timestamp of the transaction currently being executed.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot supply a transaction context.
    fn tx_timestamp(&self) -> LedgerResult<Timestamp>;
}
