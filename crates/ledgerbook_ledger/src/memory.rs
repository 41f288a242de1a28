//! In-memory ledger for testing and embedding.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{HistoryIter, Ledger, RangeIter};
use crate::types::{HistoryRecord, KeyValue, Timestamp, TxId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use uuid::Uuid;

/// 2024-01-01T00:00:00Z, the default logical clock origin.
const DEFAULT_EPOCH: i64 = 1_704_067_200;

#[derive(Debug, Clone)]
struct TxContext {
    id: TxId,
    timestamp: Timestamp,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Current value of every live key, ordered for range scans.
    entries: BTreeMap<String, Vec<u8>>,
    /// Every write ever made, per key, in commit order.
    history: HashMap<String, Vec<HistoryRecord>>,
    /// Transaction stamping subsequent writes.
    current_tx: Option<TxContext>,
    /// Number of transactions started so far.
    tx_count: i64,
    /// Remaining writes before injected failures start.
    writes_remaining: Option<usize>,
}

/// An in-memory ledger.
///
/// Writes are grouped into transactions. [`InMemoryLedger::begin_transaction`]
/// allocates a fresh transaction ID and advances a logical clock by one
/// second; every write until the next call is stamped with that ID and
/// time. Writing, or asking for the transaction timestamp, without an open
/// transaction opens one implicitly.
///
/// Within a transaction, repeated writes to one key collapse into a single
/// history entry holding the last value, the way a committed ledger
/// transaction only records its final write set.
///
/// # Thread Safety
///
/// This ledger is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use ledgerbook_ledger::{InMemoryLedger, Ledger};
///
/// let mut ledger = InMemoryLedger::new();
/// ledger.begin_transaction();
/// ledger.put("k", b"v1").unwrap();
/// ledger.begin_transaction();
/// ledger.delete("k").unwrap();
///
/// let history: Vec<_> = ledger.history_of("k").unwrap().collect();
/// assert_eq!(history.len(), 2);
/// ```
#[derive(Debug)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    epoch: Timestamp,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::with_epoch(Timestamp::from_secs(DEFAULT_EPOCH))
    }
}

impl InMemoryLedger {
    /// Creates an empty ledger whose clock starts at 2024-01-01T00:00:00Z.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty ledger whose clock starts at `epoch`.
    #[must_use]
    pub fn with_epoch(epoch: Timestamp) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            epoch,
        }
    }

    /// Starts a new transaction and returns its ID.
    pub fn begin_transaction(&mut self) -> TxId {
        let mut state = self.state.write();
        Self::open_tx(&mut state, self.epoch).id
    }

    /// Returns the ID of the open transaction, if any.
    #[must_use]
    pub fn current_tx(&self) -> Option<TxId> {
        self.state.read().current_tx.as_ref().map(|tx| tx.id.clone())
    }

    /// Lets `n` more writes succeed, then fails every write with
    /// [`LedgerError::Unavailable`].
    ///
    /// Useful for exercising partial-failure paths.
    pub fn fail_writes_after(&mut self, n: usize) {
        self.state.write().writes_remaining = Some(n);
    }

    /// Removes any injected write failure.
    pub fn clear_faults(&mut self) {
        self.state.write().writes_remaining = None;
    }

    /// Returns all live keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.read().entries.keys().cloned().collect()
    }

    /// Returns true if `key` currently holds a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.read().entries.contains_key(key)
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Returns true if no key holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    fn open_tx(state: &mut LedgerState, epoch: Timestamp) -> TxContext {
        state.tx_count += 1;
        let tx = TxContext {
            id: TxId::new(Uuid::new_v4().simple().to_string()),
            timestamp: epoch.plus_secs(state.tx_count),
        };
        state.current_tx = Some(tx.clone());
        tx
    }

    fn check_key(key: &str) -> LedgerResult<()> {
        if key.is_empty() {
            return Err(LedgerError::invalid_key(key, "key must not be empty"));
        }
        Ok(())
    }

    fn write(&mut self, key: &str, value: Option<Vec<u8>>) -> LedgerResult<()> {
        let mut state = self.state.write();

        if let Some(remaining) = state.writes_remaining.as_mut() {
            if *remaining == 0 {
                return Err(LedgerError::unavailable(format!(
                    "injected write failure on {key:?}"
                )));
            }
            *remaining -= 1;
        }

        let tx = match state.current_tx.clone() {
            Some(tx) => tx,
            None => Self::open_tx(&mut state, self.epoch),
        };

        match &value {
            Some(bytes) => {
                state.entries.insert(key.to_string(), bytes.clone());
            }
            None => {
                state.entries.remove(key);
            }
        }

        let versions = state.history.entry(key.to_string()).or_default();
        match versions.last_mut() {
            Some(last) if last.tx_id == tx.id => last.value = value,
            _ => versions.push(HistoryRecord {
                tx_id: tx.id,
                value,
                timestamp: tx.timestamp,
            }),
        }
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Self::check_key(key)?;
        Ok(self.state.read().entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> LedgerResult<()> {
        Self::check_key(key)?;
        if value.is_empty() {
            return Err(LedgerError::EmptyValue {
                key: key.to_string(),
            });
        }
        self.write(key, Some(value.to_vec()))
    }

    fn delete(&mut self, key: &str) -> LedgerResult<()> {
        Self::check_key(key)?;
        if !self.state.read().entries.contains_key(key) {
            return Ok(());
        }
        self.write(key, None)
    }

    fn range_scan(&self, start: &str, end: &str) -> LedgerResult<RangeIter<'_>> {
        let state = self.state.read();

        // An inverted range would panic inside BTreeMap::range.
        if !end.is_empty() && end <= start {
            return Ok(Box::new(std::iter::empty()));
        }
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };

        let snapshot: Vec<LedgerResult<KeyValue>> = state
            .entries
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(key, value)| {
                Ok(KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn history_of(&self, key: &str) -> LedgerResult<HistoryIter<'_>> {
        Self::check_key(key)?;
        let versions = self
            .state
            .read()
            .history
            .get(key)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(versions.into_iter().map(Ok)))
    }

    fn tx_timestamp(&self) -> LedgerResult<Timestamp> {
        let mut state = self.state.write();
        let timestamp = match state.current_tx.as_ref() {
            Some(tx) => tx.timestamp,
            None => Self::open_tx(&mut state, self.epoch).timestamp,
        };
        Ok(timestamp)
    }
}
