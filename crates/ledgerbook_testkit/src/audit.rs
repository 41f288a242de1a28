//! Index audit.
//!
//! Rebuilds the index entries every live record should have and compares
//! them with what the ledger actually holds, so tests can assert that
//! each live record owns exactly one entry per index and nothing else is
//! left behind.

use ledgerbook_core::{CompositeKeyIndex, Config, CoreResult, Index, KeyCodec, Record};
use ledgerbook_ledger::Ledger;
use std::collections::BTreeMap;

/// Differences between expected and stored entries of one index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Index that was audited.
    pub index_name: String,
    /// Tuples of live records with no stored entry.
    pub missing: Vec<Vec<String>>,
    /// Stored tuples no live record projects to.
    pub stale: Vec<Vec<String>>,
    /// Tuples stored more often than live records project to them.
    pub duplicated: Vec<Vec<String>>,
}

impl AuditReport {
    /// Returns true if the index matches the live records exactly.
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.duplicated.is_empty()
    }
}

/// Audits the indexes of one record type.
pub struct IndexAudit<'l> {
    ledger: &'l dyn Ledger,
    codec: KeyCodec,
    index: CompositeKeyIndex,
}

impl<'l> IndexAudit<'l> {
    /// Creates an audit over `ledger` using `config`'s key layout.
    pub fn new(ledger: &'l dyn Ledger, config: &Config) -> Self {
        Self {
            ledger,
            codec: KeyCodec::new(config.key_separator),
            index: CompositeKeyIndex::from_config(config),
        }
    }

    /// Returns every stored tuple of `index_name`, in key order.
    pub fn entries(&self, index_name: &str) -> CoreResult<Vec<Vec<String>>> {
        self.index.query_by_prefix(self.ledger, index_name, &[])?.collect()
    }

    /// Decodes every live record whose key starts with `key_prefix`.
    pub fn live_records<R: Record>(&self, key_prefix: &str) -> CoreResult<Vec<R>> {
        let mut records = Vec::new();
        for item in self.ledger.range_scan(key_prefix, "")? {
            let kv = item?;
            if !kv.key.starts_with(key_prefix) {
                break;
            }
            if self.codec.is_composite(&kv.key) {
                continue;
            }
            records.push(R::decode(&kv.value)?);
        }
        Ok(records)
    }

    /// Compares each index of `R` with the live records under `key_prefix`.
    pub fn check<R: Record>(&self, key_prefix: &str) -> CoreResult<Vec<AuditReport>> {
        let records: Vec<R> = self.live_records(key_prefix)?;
        R::indexes()
            .iter()
            .map(|def| -> CoreResult<AuditReport> {
                let mut expected: BTreeMap<Vec<String>, usize> = BTreeMap::new();
                for record in &records {
                    *expected.entry(record.projection(def)).or_default() += 1;
                }
                let mut stored: BTreeMap<Vec<String>, usize> = BTreeMap::new();
                for tuple in self.entries(def.name)? {
                    *stored.entry(tuple).or_default() += 1;
                }

                let mut report = AuditReport {
                    index_name: def.name.to_string(),
                    ..AuditReport::default()
                };
                for (tuple, &want) in &expected {
                    if !stored.contains_key(tuple) {
                        report.missing.push(tuple.clone());
                    } else if want > 1 {
                        // Two records projecting to one tuple share a key.
                        report.duplicated.push(tuple.clone());
                    }
                }
                for tuple in stored.keys() {
                    if !expected.contains_key(tuple) {
                        report.stale.push(tuple.clone());
                    }
                }
                Ok(report)
            })
            .collect()
    }

    /// Panics with the report if any index of `R` is inconsistent.
    pub fn assert_consistent<R: Record>(&self, key_prefix: &str) {
        let reports = self.check::<R>(key_prefix).expect("audit should read the ledger");
        for report in reports {
            assert!(report.is_consistent(), "index {} out of sync: {report:?}", report.index_name);
        }
    }
}

impl std::fmt::Debug for IndexAudit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexAudit")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestLedger;
    use ledgerbook_core::records::Balance;

    #[test]
    fn consistent_after_transfers() {
        let mut ledger = crate::fixtures::scenarios::seeded_balances(&[("alice", 100)]);
        let contract = ledgerbook_core::contract::LoyaltyContract::default();
        ledger
            .invoke(&contract, "convertIntegral", &["alice", "bank", "shopping_mall", "10"])
            .unwrap();

        let audit = IndexAudit::new(&ledger.ledger, &ledger.config);
        assert_eq!(audit.live_records::<Balance>("").unwrap().len(), 2);
        audit.assert_consistent::<Balance>("");
    }

    #[test]
    fn detects_stale_and_missing() {
        let mut ledger = TestLedger::new();
        let contract = ledgerbook_core::contract::LoyaltyContract::default();
        ledger
            .invoke(&contract, "initIntegral", &["alice", "bank", "100", ""])
            .unwrap();
        let stale = vec!["alice".to_string(), "bank".to_string(), "1".to_string()];
        let live = vec!["alice".to_string(), "bank".to_string(), "100".to_string()];
        {
            let mut store = ledger.store();
            store.repair_entry("username~all", Some(&live), None).unwrap();
            store.repair_entry("username~all", None, Some(&stale)).unwrap();
        }

        let audit = IndexAudit::new(&ledger.ledger, &ledger.config);
        let reports = audit.check::<Balance>("").unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].missing, vec![live]);
        assert_eq!(reports[0].stale, vec![stale]);
        assert!(!reports[0].is_consistent());
    }
}
