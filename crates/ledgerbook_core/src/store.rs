//! Typed record storage with index maintenance.
//!
//! [`RecordStore`] serializes records under their primary key and keeps
//! every declared index in step with the record. Mutations run in a fixed
//! order:
//!
//! ```text
//! create: write record -> create index entries
//! update: retract old entries -> write record -> create new entries
//! delete: delete record -> retract entries
//! ```
//!
//! Keys, tuples and the index marker are validated before the first ledger
//! write, so encoding and argument errors never leave partial state. Ledger
//! failures part-way through do; [`RecordStore::reindex_record`] repairs the
//! entries of a live record after such a failure.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::history::{EntryIter, HistoryReader};
use crate::index::{CompositeKeyIndex, Index};
use crate::key::KeyCodec;
use crate::query::{self, IndexProjection, PrefixScan};
use crate::record::Record;
use crate::types::IndexDef;
use ledgerbook_ledger::{KeyValue, Ledger, Timestamp};
use tracing::{debug, info};

/// Record storage bound to one ledger for the duration of an invocation.
pub struct RecordStore<'a, I: Index = CompositeKeyIndex> {
    ledger: &'a mut dyn Ledger,
    codec: KeyCodec,
    index: I,
}

impl<'a> RecordStore<'a> {
    /// Creates a store using composite-key indexes built from `config`.
    pub fn new(ledger: &'a mut dyn Ledger, config: &Config) -> Self {
        Self {
            ledger,
            codec: KeyCodec::new(config.key_separator),
            index: CompositeKeyIndex::from_config(config),
        }
    }
}

impl<'a, I: Index> RecordStore<'a, I> {
    /// Creates a store with a custom index implementation.
    pub fn with_index(ledger: &'a mut dyn Ledger, codec: KeyCodec, index: I) -> Self {
        Self {
            ledger,
            codec,
            index,
        }
    }

    /// Returns the index implementation.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &dyn Ledger {
        &*self.ledger
    }

    /// Returns the timestamp of the running transaction.
    pub fn tx_timestamp(&self) -> CoreResult<Timestamp> {
        Ok(self.ledger.tx_timestamp()?)
    }

    fn check_key(&self, key: &str) -> CoreResult<()> {
        if key.is_empty() {
            return Err(CoreError::invalid_field("key", "must not be empty"));
        }
        if self.codec.is_composite(key) {
            return Err(CoreError::invalid_field(
                "key",
                format!("{key:?} lies in the composite key namespace"),
            ));
        }
        Ok(())
    }

    fn check_projections(&self, projections: &[(IndexDef, Vec<String>)]) -> CoreResult<()> {
        for (def, tuple) in projections {
            if tuple.len() != def.arity() {
                return Err(CoreError::encoding(format!(
                    "index {} takes {} attributes, record projected {}",
                    def.name,
                    def.arity(),
                    tuple.len()
                )));
            }
            self.index.check(def.name, tuple)?;
        }
        Ok(())
    }

    /// Returns true if a record lives at `key`.
    pub fn exists(&self, key: &str) -> CoreResult<bool> {
        self.check_key(key)?;
        Ok(self.ledger.get(key)?.is_some())
    }

    /// Reads the stored bytes of a record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no record lives at `key`.
    pub fn read_raw(&self, key: &str) -> CoreResult<Vec<u8>> {
        self.check_key(key)?;
        self.ledger.get(key)?.ok_or_else(|| CoreError::not_found(key))
    }

    /// Reads and decodes a record.
    pub fn read<R: Record>(&self, key: &str) -> CoreResult<R> {
        R::decode(&self.read_raw(key)?)
    }

    /// Stores a new record and creates its index entries.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyExists`] if a record already lives at
    /// the record's primary key.
    pub fn create<R: Record>(&mut self, record: &R) -> CoreResult<()> {
        let key = record.primary_key();
        self.check_key(&key)?;
        let projections = record.projections();
        self.check_projections(&projections)?;
        let bytes = record.encode()?;

        if self.ledger.get(&key)?.is_some() {
            return Err(CoreError::already_exists(key));
        }

        self.ledger.put(&key, &bytes)?;
        for (def, tuple) in &projections {
            self.index.reindex(&mut *self.ledger, def.name, None, Some(tuple))?;
        }
        info!(kind = R::KIND, key = %key, "record created");
        Ok(())
    }

    /// Applies `mutator` to the stored record and writes the result.
    ///
    /// Index entries of the previous version are retracted before the write
    /// and entries for the new version created after it, even when a tuple
    /// did not change.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no record lives at `key`
    /// - [`CoreError::DomainConstraint`] if the mutator changed the primary key
    /// - Any error returned by the mutator, before anything is written
    pub fn update<R, F>(&mut self, key: &str, mutator: F) -> CoreResult<R>
    where
        R: Record,
        F: FnOnce(R) -> CoreResult<R>,
    {
        let current = self.read::<R>(key)?;
        let old = current.projections();

        let updated = mutator(current)?;
        if updated.primary_key() != key {
            return Err(CoreError::domain_constraint(format!(
                "update of {key} must not change the primary key"
            )));
        }
        let new = updated.projections();
        self.check_projections(&new)?;
        let bytes = updated.encode()?;

        for (def, tuple) in &old {
            self.index.reindex(&mut *self.ledger, def.name, Some(tuple), None)?;
        }
        self.ledger.put(key, &bytes)?;
        for (def, tuple) in &new {
            self.index.reindex(&mut *self.ledger, def.name, None, Some(tuple))?;
        }
        info!(kind = R::KIND, key, "record updated");
        Ok(updated)
    }

    /// Updates the record at `key` if present, otherwise creates the record
    /// returned by `create`.
    pub fn upsert<R, C, F>(&mut self, key: &str, create: C, mutator: F) -> CoreResult<R>
    where
        R: Record,
        C: FnOnce() -> CoreResult<R>,
        F: FnOnce(R) -> CoreResult<R>,
    {
        if self.exists(key)? {
            return self.update(key, mutator);
        }
        let record = create()?;
        if record.primary_key() != key {
            return Err(CoreError::domain_constraint(format!(
                "record created for {key} carries key {}",
                record.primary_key()
            )));
        }
        self.create(&record)?;
        Ok(record)
    }

    /// Deletes a record and retracts its index entries.
    ///
    /// Returns the removed record.
    pub fn delete<R: Record>(&mut self, key: &str) -> CoreResult<R> {
        let record = self.read::<R>(key)?;
        let old = record.projections();
        self.check_projections(&old)?;

        self.ledger.delete(key)?;
        for (def, tuple) in &old {
            self.index.reindex(&mut *self.ledger, def.name, Some(tuple), None)?;
        }
        info!(kind = R::KIND, key, "record deleted");
        Ok(record)
    }

    /// Recreates the index entries of the record at `key` from its current
    /// value.
    ///
    /// Used to repair indexes after a ledger failure interrupted a mutation.
    /// Entries of versions the record no longer has are not touched; use
    /// [`RecordStore::repair_entry`] to retract them.
    pub fn reindex_record<R: Record>(&mut self, key: &str) -> CoreResult<R> {
        let record = self.read::<R>(key)?;
        let projections = record.projections();
        self.check_projections(&projections)?;
        for (def, tuple) in &projections {
            self.index
                .reindex(&mut *self.ledger, def.name, Some(tuple), Some(tuple))?;
        }
        debug!(kind = R::KIND, key, "index entries rebuilt");
        Ok(record)
    }

    /// Runs one raw index transition.
    pub fn repair_entry(
        &mut self,
        index_name: &str,
        old: Option<&[String]>,
        new: Option<&[String]>,
    ) -> CoreResult<()> {
        self.index.reindex(&mut *self.ledger, index_name, old, new)
    }

    /// Scans primary records in `[start, end)`, skipping index entries.
    ///
    /// An empty `end` leaves the range unbounded above.
    pub fn scan(&self, start: &str, end: &str) -> CoreResult<Vec<KeyValue>> {
        let mut records = Vec::new();
        for item in self.ledger.range_scan(start, end)? {
            let kv = item?;
            if !self.codec.is_composite(&kv.key) {
                records.push(kv);
            }
        }
        debug!(start, end, count = records.len(), "primary scan");
        Ok(records)
    }

    /// Returns the history of the record at `key`.
    pub fn history(&self, key: &str) -> CoreResult<EntryIter<'_>> {
        self.check_key(key)?;
        HistoryReader::new(&*self.ledger).history(key)
    }

    /// Returns the history of the record at `key`, projecting every value.
    pub fn history_projected<F>(&self, key: &str, projection: F) -> CoreResult<EntryIter<'_>>
    where
        F: Fn(&[u8]) -> CoreResult<Vec<u8>> + 'static,
    {
        self.check_key(key)?;
        HistoryReader::new(&*self.ledger).history_projected(key, projection)
    }

    /// Scans an index by attribute prefix.
    pub fn query_by_prefix(
        &self,
        index_name: &str,
        prefix: &[String],
    ) -> CoreResult<PrefixScan<'_>> {
        self.index.query_by_prefix(&*self.ledger, index_name, prefix)
    }

    /// Runs a prefix query over `P::INDEX` and decodes the rows.
    pub fn query_rows<P: IndexProjection>(&self, prefix: &[String]) -> CoreResult<Vec<P>> {
        query::query_rows(&self.index, &*self.ledger, prefix)
    }
}

impl<I: Index + std::fmt::Debug> std::fmt::Debug for RecordStore<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("codec", &self.codec)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerbook_ledger::InMemoryLedger;
    use serde::{Deserialize, Serialize};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        owner: String,
        qty: i64,
    }

    const BY_OWNER: IndexDef = IndexDef::new("owner~item", &["owner", "id", "qty"]);

    impl Record for Item {
        const KIND: &'static str = "Item";

        fn primary_key(&self) -> String {
            format!("Item_{}", self.id)
        }

        fn indexes() -> &'static [IndexDef] {
            &[BY_OWNER]
        }

        fn projection(&self, _index: &IndexDef) -> Vec<String> {
            vec![self.owner.clone(), self.id.clone(), self.qty.to_string()]
        }
    }

    #[derive(Debug, PartialEq, Serialize)]
    struct OwnerRow {
        owner: String,
        id: String,
        qty: String,
    }

    impl IndexProjection for OwnerRow {
        const INDEX: IndexDef = BY_OWNER;

        fn from_attributes(attributes: Vec<String>) -> CoreResult<Self> {
            let [owner, id, qty]: [String; 3] = attributes
                .try_into()
                .map_err(|_| CoreError::decoding("owner~item row"))?;
            Ok(Self { owner, id, qty })
        }
    }

    fn item(id: &str, owner: &str, qty: i64) -> Item {
        Item {
            id: id.into(),
            owner: owner.into(),
            qty,
        }
    }

    fn index_tuples(store: &RecordStore<'_>) -> Vec<Vec<String>> {
        store
            .query_by_prefix(BY_OWNER.name, &[])
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn create_then_read() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();

        assert_eq!(store.read::<Item>("Item_1").unwrap(), item("1", "alice", 5));
        assert_eq!(index_tuples(&store), vec![vec!["alice", "1", "5"]]);
    }

    #[test]
    fn create_twice_fails() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();

        let result = store.create(&item("1", "bob", 1));
        assert!(matches!(result, Err(CoreError::AlreadyExists { .. })));
        assert_eq!(store.read::<Item>("Item_1").unwrap().owner, "alice");
    }

    #[test]
    fn read_missing_is_not_found() {
        let mut ledger = InMemoryLedger::new();
        let store = RecordStore::new(&mut ledger, &Config::default());
        assert!(matches!(
            store.read::<Item>("Item_9"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn update_moves_index_entry() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();

        let updated = store
            .update::<Item, _>("Item_1", |mut i| {
                i.qty = 7;
                Ok(i)
            })
            .unwrap();

        assert_eq!(updated.qty, 7);
        assert_eq!(index_tuples(&store), vec![vec!["alice", "1", "7"]]);
    }

    #[test]
    fn update_missing_is_not_found() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        let result = store.update::<Item, _>("Item_1", Ok);
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn update_cannot_change_key() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();

        let result = store.update::<Item, _>("Item_1", |mut i| {
            i.id = "2".into();
            Ok(i)
        });
        assert!(matches!(result, Err(CoreError::DomainConstraint { .. })));
        assert_eq!(index_tuples(&store), vec![vec!["alice", "1", "5"]]);
    }

    #[test]
    fn mutator_error_writes_nothing() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();

        let result = store.update::<Item, _>("Item_1", |_| Err(CoreError::domain_constraint("no")));
        assert!(result.is_err());
        assert_eq!(store.read::<Item>("Item_1").unwrap().qty, 5);
        assert_eq!(index_tuples(&store).len(), 1);
    }

    #[test]
    fn bad_tuple_rejected_before_write() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        let result = store.create(&item("1", "al\u{0}ice", 5));
        assert!(matches!(result, Err(CoreError::Encoding { .. })));
        drop(store);
        assert!(ledger.is_empty());
    }

    #[test]
    fn upsert_creates_then_updates() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        let add = |mut i: Item| -> CoreResult<Item> {
            i.qty += 1;
            Ok(i)
        };

        let created = store
            .upsert("Item_1", || Ok(item("1", "alice", 1)), add)
            .unwrap();
        assert_eq!(created.qty, 1);

        let updated = store
            .upsert("Item_1", || Ok(item("1", "alice", 1)), add)
            .unwrap();
        assert_eq!(updated.qty, 2);
        assert_eq!(index_tuples(&store), vec![vec!["alice", "1", "2"]]);
    }

    #[test]
    fn upsert_rejects_mismatched_key() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        let result = store.upsert::<Item, _, _>("Item_1", || Ok(item("2", "alice", 1)), Ok);
        assert!(matches!(result, Err(CoreError::DomainConstraint { .. })));
    }

    #[test]
    fn delete_retracts_entries() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();

        let removed = store.delete::<Item>("Item_1").unwrap();
        assert_eq!(removed.qty, 5);
        assert!(!store.exists("Item_1").unwrap());
        assert!(index_tuples(&store).is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        assert!(matches!(
            store.delete::<Item>("Item_1"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn composite_keys_are_not_primary_keys() {
        let mut ledger = InMemoryLedger::new();
        let store = RecordStore::new(&mut ledger, &Config::default());
        assert!(matches!(
            store.read_raw("\u{0}owner~item\u{0}"),
            Err(CoreError::InvalidFieldValue { .. })
        ));
        assert!(store.read_raw("").is_err());
    }

    #[test]
    fn scan_skips_index_entries() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();
        store.create(&item("2", "bob", 3)).unwrap();

        let keys: Vec<_> = store
            .scan("", "")
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["Item_1", "Item_2"]);
    }

    #[test]
    fn query_rows_by_owner() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();
        store.create(&item("2", "bob", 3)).unwrap();
        store.create(&item("3", "alice", 1)).unwrap();

        let rows: Vec<OwnerRow> = store.query_rows(&["alice".to_string()]).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn history_follows_lifecycle() {
        let mut ledger = InMemoryLedger::new();
        ledger.begin_transaction();
        RecordStore::new(&mut ledger, &Config::default())
            .create(&item("1", "alice", 5))
            .unwrap();
        ledger.begin_transaction();
        RecordStore::new(&mut ledger, &Config::default())
            .update::<Item, _>("Item_1", |mut i| {
                i.qty = 6;
                Ok(i)
            })
            .unwrap();
        ledger.begin_transaction();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.delete::<Item>("Item_1").unwrap();

        let entries: Vec<_> = store.history("Item_1").unwrap().map(Result::unwrap).collect();
        assert_eq!(entries.len(), 3);
        assert!(entries[2].is_delete);
    }

    #[test]
    fn reindex_record_repairs_missing_entry() {
        let mut ledger = InMemoryLedger::new();
        let mut store = RecordStore::new(&mut ledger, &Config::default());
        store.create(&item("1", "alice", 5)).unwrap();
        let tuple: Vec<String> = vec!["alice".into(), "1".into(), "5".into()];
        store.repair_entry(BY_OWNER.name, Some(&tuple), None).unwrap();
        assert!(index_tuples(&store).is_empty());

        store.reindex_record::<Item>("Item_1").unwrap();
        assert_eq!(index_tuples(&store), vec![tuple]);
    }

    #[derive(Debug, Default)]
    struct RecordingIndex {
        inner: CompositeKeyIndex,
        steps: RefCell<Vec<String>>,
    }

    impl Index for RecordingIndex {
        fn check(&self, index_name: &str, attributes: &[String]) -> CoreResult<()> {
            self.inner.check(index_name, attributes)
        }

        fn reindex(
            &self,
            ledger: &mut dyn Ledger,
            index_name: &str,
            old: Option<&[String]>,
            new: Option<&[String]>,
        ) -> CoreResult<()> {
            let stored = match ledger.get("Item_1")? {
                Some(bytes) => Some(Item::decode(&bytes)?.qty),
                None => None,
            };
            let step = match (old, new) {
                (Some(_), None) => "retract",
                (None, Some(_)) => "create",
                _ => "rebuild",
            };
            self.steps.borrow_mut().push(format!("{step} stored={stored:?}"));
            self.inner.reindex(ledger, index_name, old, new)
        }

        fn query_by_prefix<'l>(
            &self,
            ledger: &'l dyn Ledger,
            index_name: &str,
            prefix: &[String],
        ) -> CoreResult<PrefixScan<'l>> {
            self.inner.query_by_prefix(ledger, index_name, prefix)
        }
    }

    #[test]
    fn custom_index_sees_retract_write_create() {
        let mut ledger = InMemoryLedger::new();
        let mut store =
            RecordStore::with_index(&mut ledger, KeyCodec::default(), RecordingIndex::default());
        store.create(&item("1", "alice", 5)).unwrap();
        store
            .update("Item_1", |mut i: Item| {
                i.qty = 6;
                Ok(i)
            })
            .unwrap();
        let rows: Vec<OwnerRow> = store.query_rows(&["alice".to_string()]).unwrap();
        assert_eq!(rows[0].qty, "6");
        store.delete::<Item>("Item_1").unwrap();

        assert_eq!(
            *store.index().steps.borrow(),
            vec![
                "create stored=Some(5)",
                "retract stored=Some(5)",
                "create stored=Some(6)",
                "retract stored=None",
            ]
        );
    }
}
