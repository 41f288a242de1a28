//! Prefix queries over composite-key indexes.
//!
//! A query names an index and a leading run of its attributes. The scan
//! covers `[encode_prefix(index, prefix), encode_prefix(..) + U+10FFFF)` and
//! yields each hit's decoded attribute tuple in key order. Nothing is
//! filtered after the scan; the range alone decides membership.

use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::key::KeyCodec;
use crate::types::IndexDef;
use ledgerbook_ledger::RangeIter;
use serde::Serialize;

/// Lazy stream of attribute tuples produced by a prefix scan.
pub struct PrefixScan<'l> {
    inner: RangeIter<'l>,
    codec: KeyCodec,
    index_name: String,
    arity: Option<usize>,
}

impl<'l> PrefixScan<'l> {
    /// Wraps a raw range scan over `index_name`.
    pub fn new(inner: RangeIter<'l>, codec: KeyCodec, index_name: impl Into<String>) -> Self {
        Self {
            inner,
            codec,
            index_name: index_name.into(),
            arity: None,
        }
    }

    /// Rejects keys that do not carry exactly `arity` attributes.
    #[must_use]
    pub fn expecting(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Returns the scanned index name.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn decode(&self, key: &str) -> CoreResult<Vec<String>> {
        let decoded = match self.arity {
            Some(arity) => self.codec.decode_expecting(key, arity)?,
            None => self.codec.decode(key)?,
        };
        if decoded.index_name != self.index_name {
            return Err(CoreError::decoding(format!(
                "key of index {} returned by a scan of {}",
                decoded.index_name, self.index_name
            )));
        }
        Ok(decoded.attributes)
    }
}

impl Iterator for PrefixScan<'_> {
    type Item = CoreResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(item.map_err(CoreError::from).and_then(|kv| self.decode(&kv.key)))
    }
}

impl std::fmt::Debug for PrefixScan<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixScan")
            .field("index_name", &self.index_name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A row type rebuilt from one entry of an index.
///
/// Index queries answer from the composite keys alone, so every field a row
/// exposes must be part of the index tuple.
pub trait IndexProjection: Serialize + Sized {
    /// The index the rows come from.
    const INDEX: IndexDef;

    /// Builds a row from a decoded attribute tuple.
    ///
    /// The tuple is guaranteed to carry `INDEX.arity()` attributes.
    fn from_attributes(attributes: Vec<String>) -> CoreResult<Self>;
}

/// Runs a prefix query and materialises typed rows.
///
/// An empty result is not an error.
pub fn query_rows<P, I>(
    index: &I,
    ledger: &dyn ledgerbook_ledger::Ledger,
    prefix: &[String],
) -> CoreResult<Vec<P>>
where
    P: IndexProjection,
    I: Index + ?Sized,
{
    index
        .query_by_prefix(ledger, P::INDEX.name, prefix)?
        .expecting(P::INDEX.arity())
        .map(|attributes| attributes.and_then(P::from_attributes))
        .collect()
}

/// Renders rows as a JSON array. No rows render as `[]`.
pub fn render_rows<P: Serialize>(rows: &[P]) -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CompositeKeyIndex;
    use ledgerbook_ledger::{InMemoryLedger, Ledger};
    use serde::Serialize;

    #[derive(Debug, PartialEq, Serialize)]
    struct Row {
        user: String,
        item: String,
    }

    impl IndexProjection for Row {
        const INDEX: IndexDef = IndexDef::new("user~item", &["user", "item"]);

        fn from_attributes(mut attributes: Vec<String>) -> CoreResult<Self> {
            let item = attributes.pop().unwrap_or_default();
            let user = attributes.pop().unwrap_or_default();
            Ok(Self { user, item })
        }
    }

    fn seeded() -> (CompositeKeyIndex, InMemoryLedger) {
        let index = CompositeKeyIndex::default();
        let mut ledger = InMemoryLedger::new();
        for (user, item) in [("bob", "b1"), ("alice", "a2"), ("alice", "a1"), ("alice2", "x")] {
            let tuple = vec![user.to_string(), item.to_string()];
            index.reindex(&mut ledger, "user~item", None, Some(&tuple)).unwrap();
        }
        ledger.put("alice-record", b"{}").unwrap();
        (index, ledger)
    }

    #[test]
    fn prefix_returns_matching_rows_in_key_order() {
        let (index, ledger) = seeded();
        let rows: Vec<Row> = query_rows(&index, &ledger, &["alice".to_string()]).unwrap();
        let items: Vec<_> = rows.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, vec!["a1", "a2"]);
    }

    #[test]
    fn empty_prefix_returns_whole_index() {
        let (index, ledger) = seeded();
        let rows: Vec<Row> = query_rows(&index, &ledger, &[]).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].user, "alice");
        assert_eq!(rows[3].user, "bob");
    }

    #[test]
    fn no_match_renders_empty_array() {
        let (index, ledger) = seeded();
        let rows: Vec<Row> = query_rows(&index, &ledger, &["carol".to_string()]).unwrap();
        assert!(rows.is_empty());
        assert_eq!(render_rows(&rows).unwrap(), b"[]".to_vec());
    }

    #[test]
    fn wrong_arity_is_a_decoding_error() {
        let (index, mut ledger) = seeded();
        let short = vec!["alice".to_string()];
        index.reindex(&mut ledger, "user~item", None, Some(&short)).unwrap();

        let result: CoreResult<Vec<Row>> = query_rows(&index, &ledger, &short);
        assert!(matches!(result, Err(CoreError::Decoding { .. })));
    }

    #[test]
    fn render_rows_is_json_array() {
        let rows = vec![Row {
            user: "alice".into(),
            item: "a1".into(),
        }];
        let json = String::from_utf8(render_rows(&rows).unwrap()).unwrap();
        assert_eq!(json, r#"[{"user":"alice","item":"a1"}]"#);
    }
}
