//! Audit history of primary records.
//!
//! History is read straight from the ledger, oldest first, and rendered as
//! a JSON array of `{TxId, Value, Timestamp, IsDelete}` objects. Values are
//! embedded verbatim; a deletion renders `Value` as `null`.

use crate::error::{CoreError, CoreResult};
use ledgerbook_ledger::{HistoryRecord, Ledger, Timestamp, TxId};
use serde::Serialize;
use serde_json::value::RawValue;
use std::iter::Peekable;
use tracing::debug;

/// Transformation applied to every non-deleted history value.
pub type ValueProjection<'l> = Box<dyn Fn(&[u8]) -> CoreResult<Vec<u8>> + 'l>;

/// One version of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Transaction that wrote this version.
    pub tx_id: TxId,
    /// Record bytes, `None` for a deletion.
    pub value: Option<Vec<u8>>,
    /// Commit time of the transaction.
    pub timestamp: Timestamp,
    /// True if this version deleted the record.
    pub is_delete: bool,
}

impl HistoryEntry {
    fn from_record(record: HistoryRecord) -> Self {
        let is_delete = record.is_delete();
        Self {
            tx_id: record.tx_id,
            value: record.value,
            timestamp: record.timestamp,
            is_delete,
        }
    }
}

/// Reads history for primary keys.
#[derive(Clone, Copy)]
pub struct HistoryReader<'l> {
    ledger: &'l dyn Ledger,
}

impl<'l> HistoryReader<'l> {
    /// Creates a reader over `ledger`.
    pub fn new(ledger: &'l dyn Ledger) -> Self {
        Self { ledger }
    }

    /// Returns the history of `key`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HistoryUnavailable`] if the ledger cannot
    /// produce a history or if the key has never been written.
    pub fn history(&self, key: &str) -> CoreResult<EntryIter<'l>> {
        let mut inner = self
            .ledger
            .history_of(key)
            .map_err(|e| CoreError::history_unavailable(key, e.to_string()))?
            .peekable();
        if inner.peek().is_none() {
            return Err(CoreError::history_unavailable(key, "no history recorded"));
        }
        debug!(key, "reading history");
        Ok(EntryIter {
            inner,
            projection: None,
        })
    }

    /// Returns the history of `key` with `projection` applied to every
    /// stored value. Deletions pass through untouched.
    pub fn history_projected<F>(&self, key: &str, projection: F) -> CoreResult<EntryIter<'l>>
    where
        F: Fn(&[u8]) -> CoreResult<Vec<u8>> + 'l,
    {
        let mut entries = self.history(key)?;
        entries.projection = Some(Box::new(projection));
        Ok(entries)
    }
}

impl std::fmt::Debug for HistoryReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryReader").finish_non_exhaustive()
    }
}

/// Lazy, finite iterator over a key's history.
pub struct EntryIter<'l> {
    inner: Peekable<ledgerbook_ledger::HistoryIter<'l>>,
    projection: Option<ValueProjection<'l>>,
}

impl EntryIter<'_> {
    /// Drains the history into the JSON array returned to callers.
    pub fn render_json(self) -> CoreResult<Vec<u8>> {
        let rows = self
            .map(|entry| entry.and_then(|e| HistoryRow::try_from(&e)))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(serde_json::to_vec(&rows)?)
    }
}

impl Iterator for EntryIter<'_> {
    type Item = CoreResult<HistoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.inner.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        let mut entry = HistoryEntry::from_record(record);
        if let (Some(project), Some(value)) = (&self.projection, &entry.value) {
            match project(value) {
                Ok(projected) => entry.value = Some(projected),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(entry))
    }
}

impl std::fmt::Debug for EntryIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryIter")
            .field("projected", &self.projection.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct HistoryRow {
    #[serde(rename = "TxId")]
    tx_id: String,
    #[serde(rename = "Value")]
    value: Option<Box<RawValue>>,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "IsDelete")]
    is_delete: String,
}

impl TryFrom<&HistoryEntry> for HistoryRow {
    type Error = CoreError;

    fn try_from(entry: &HistoryEntry) -> CoreResult<Self> {
        let value = match &entry.value {
            Some(bytes) if !entry.is_delete => {
                Some(serde_json::from_slice::<Box<RawValue>>(bytes)?)
            }
            _ => None,
        };
        Ok(Self {
            tx_id: entry.tx_id.to_string(),
            value,
            timestamp: entry.timestamp.to_rfc3339(),
            is_delete: entry.is_delete.to_string(),
        })
    }
}
