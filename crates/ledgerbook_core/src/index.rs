//! Composite-key index maintenance.
//!
//! The ledger offers no secondary indexes, so they are emulated with
//! valueless marker entries whose keys are composite keys. The record store
//! drives an [`Index`] around every mutation:
//!
//! - create: `reindex(name, None, Some(new))`
//! - update: `reindex(name, Some(old), None)`, write, `reindex(name, None, Some(new))`
//! - delete: write, `reindex(name, Some(old), None)`
//!
//! # Invariants
//!
//! - A live record has exactly one entry per declared index
//! - A retraction always precedes the matching re-creation; a blind create
//!   would leave the stale tuple behind
//! - Index names are disjoint namespaces

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::key::KeyCodec;
use crate::query::PrefixScan;
use ledgerbook_ledger::Ledger;
use tracing::debug;

/// Access path over a record type's non-primary attributes.
///
/// Kept as a trait so a store with native secondary indexes can replace
/// the composite-key emulation without touching the record store.
pub trait Index {
    /// Checks that `attributes` can be indexed under `index_name`,
    /// without writing anything.
    fn check(&self, _index_name: &str, _attributes: &[String]) -> CoreResult<()> {
        Ok(())
    }

    /// Retracts the entry for `old` (if any), then creates the entry for
    /// `new` (if any).
    fn reindex(
        &self,
        ledger: &mut dyn Ledger,
        index_name: &str,
        old: Option<&[String]>,
        new: Option<&[String]>,
    ) -> CoreResult<()>;

    /// Scans every entry of `index_name` whose leading attributes equal
    /// `prefix`, in key order.
    fn query_by_prefix<'l>(
        &self,
        ledger: &'l dyn Ledger,
        index_name: &str,
        prefix: &[String],
    ) -> CoreResult<PrefixScan<'l>>;
}

/// [`Index`] built from composite keys stored in the ledger itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKeyIndex {
    codec: KeyCodec,
    marker: Vec<u8>,
}

impl Default for CompositeKeyIndex {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl CompositeKeyIndex {
    /// Creates an index writing `marker` under every entry.
    pub fn new(codec: KeyCodec, marker: impl Into<Vec<u8>>) -> Self {
        Self {
            codec,
            marker: marker.into(),
        }
    }

    /// Creates an index from the configured separator and marker.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(KeyCodec::new(config.key_separator), config.index_marker.clone())
    }

    /// Returns the key codec.
    #[must_use]
    pub const fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    fn check_marker(&self) -> CoreResult<()> {
        if self.marker.is_empty() {
            return Err(CoreError::domain_constraint("index marker must not be empty"));
        }
        Ok(())
    }
}

impl Index for CompositeKeyIndex {
    fn check(&self, index_name: &str, attributes: &[String]) -> CoreResult<()> {
        self.check_marker()?;
        self.codec.encode(index_name, attributes).map(drop)
    }

    fn reindex(
        &self,
        ledger: &mut dyn Ledger,
        index_name: &str,
        old: Option<&[String]>,
        new: Option<&[String]>,
    ) -> CoreResult<()> {
        // Encode both sides first so a bad tuple fails before any write.
        if new.is_some() {
            self.check_marker()?;
        }
        let old_key = old.map(|a| self.codec.encode(index_name, a)).transpose()?;
        let new_key = new.map(|a| self.codec.encode(index_name, a)).transpose()?;

        if let Some(key) = old_key {
            debug!(index = index_name, key = ?key, "retracting index entry");
            ledger.delete(&key)?;
        }
        if let Some(key) = new_key {
            debug!(index = index_name, key = ?key, "creating index entry");
            ledger.put(&key, &self.marker)?;
        }
        Ok(())
    }

    fn query_by_prefix<'l>(
        &self,
        ledger: &'l dyn Ledger,
        index_name: &str,
        prefix: &[String],
    ) -> CoreResult<PrefixScan<'l>> {
        let start = self.codec.encode_prefix(index_name, prefix)?;
        let end = self.codec.range_end(&start);
        debug!(index = index_name, prefix = ?prefix, "prefix scan");
        let inner = ledger.range_scan(&start, &end)?;
        Ok(PrefixScan::new(inner, self.codec, index_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerbook_ledger::InMemoryLedger;

    fn attrs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn entries(index: &CompositeKeyIndex, ledger: &InMemoryLedger, name: &str) -> Vec<Vec<String>> {
        index
            .query_by_prefix(ledger, name, &[])
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn create_writes_marker() {
        let index = CompositeKeyIndex::default();
        let mut ledger = InMemoryLedger::new();
        let new = attrs(&["alice", "bank"]);
        index.reindex(&mut ledger, "idx", None, Some(&new)).unwrap();

        let key = index.codec().encode("idx", &new).unwrap();
        assert_eq!(ledger.get(&key).unwrap(), Some(vec![0x00]));
    }

    #[test]
    fn update_moves_entry() {
        let index = CompositeKeyIndex::default();
        let mut ledger = InMemoryLedger::new();
        let old = attrs(&["alice", "100"]);
        let new = attrs(&["alice", "70"]);
        index.reindex(&mut ledger, "idx", None, Some(&old)).unwrap();
        index.reindex(&mut ledger, "idx", Some(&old), Some(&new)).unwrap();

        assert_eq!(entries(&index, &ledger, "idx"), vec![new]);
    }

    #[test]
    fn unchanged_tuple_survives_reindex() {
        let index = CompositeKeyIndex::default();
        let mut ledger = InMemoryLedger::new();
        let same = attrs(&["alice", "100"]);
        index.reindex(&mut ledger, "idx", None, Some(&same)).unwrap();
        index.reindex(&mut ledger, "idx", Some(&same), Some(&same)).unwrap();

        assert_eq!(entries(&index, &ledger, "idx"), vec![same]);
    }

    #[test]
    fn retract_only() {
        let index = CompositeKeyIndex::default();
        let mut ledger = InMemoryLedger::new();
        let old = attrs(&["alice"]);
        index.reindex(&mut ledger, "idx", None, Some(&old)).unwrap();
        index.reindex(&mut ledger, "idx", Some(&old), None).unwrap();

        assert!(ledger.is_empty());
    }

    #[test]
    fn bad_new_tuple_leaves_old_entry() {
        let index = CompositeKeyIndex::default();
        let mut ledger = InMemoryLedger::new();
        let old = attrs(&["alice"]);
        let bad = attrs(&["al\u{0}ice"]);
        index.reindex(&mut ledger, "idx", None, Some(&old)).unwrap();

        let result = index.reindex(&mut ledger, "idx", Some(&old), Some(&bad));
        assert!(matches!(result, Err(CoreError::Encoding { .. })));
        assert_eq!(entries(&index, &ledger, "idx"), vec![old]);
    }

    #[test]
    fn namespaces_do_not_cross() {
        let index = CompositeKeyIndex::default();
        let mut ledger = InMemoryLedger::new();
        let tuple = attrs(&["alice"]);
        index.reindex(&mut ledger, "a~idx", None, Some(&tuple)).unwrap();
        index.reindex(&mut ledger, "a~idx2", None, Some(&tuple)).unwrap();

        assert_eq!(entries(&index, &ledger, "a~idx").len(), 1);
        assert_eq!(entries(&index, &ledger, "a~idx2").len(), 1);
    }

    #[test]
    fn check_rejects_separator() {
        let index = CompositeKeyIndex::default();
        assert!(index.check("idx", &attrs(&["ok"])).is_ok());
        assert!(index.check("idx", &attrs(&["not\u{0}ok"])).is_err());
    }

    #[test]
    fn custom_marker() {
        let config = Config::new().index_marker(b"-".to_vec());
        let index = CompositeKeyIndex::from_config(&config);
        let mut ledger = InMemoryLedger::new();
        let tuple = attrs(&["x"]);
        index.reindex(&mut ledger, "idx", None, Some(&tuple)).unwrap();

        let key = index.codec().encode("idx", &tuple).unwrap();
        assert_eq!(ledger.get(&key).unwrap(), Some(b"-".to_vec()));
    }

    #[test]
    fn empty_marker_rejected_before_retraction() {
        let index = CompositeKeyIndex::from_config(&Config::new().index_marker(Vec::new()));
        let mut ledger = InMemoryLedger::new();
        let old = attrs(&["alice"]);
        let key = index.codec().encode("idx", &old).unwrap();
        ledger.put(&key, &[0x00]).unwrap();

        let err = index
            .reindex(&mut ledger, "idx", Some(&old), Some(&attrs(&["bob"])))
            .unwrap_err();
        assert!(matches!(err, CoreError::DomainConstraint { .. }));
        assert!(index.check("idx", &old).is_err());
        assert!(ledger.contains_key(&key));

        // Retraction alone writes no marker.
        index.reindex(&mut ledger, "idx", Some(&old), None).unwrap();
        assert!(ledger.is_empty());
    }
}
