//! Composite index keys.
//!
//! A composite key packs an index name and an ordered tuple of string
//! attributes into one ledger key:
//!
//! ```text
//! SEP index_name SEP attr_1 SEP attr_2 SEP ... attr_n SEP
//! ```
//!
//! The leading separator moves every composite key out of the primary
//! keyspace. Terminating each segment with the separator makes a partial
//! tuple a strict prefix of exactly the keys that share its leading
//! attributes, so `("user")` never matches `("user2", ..)`.
//!
//! With the default U+0000 separator, which sorts below every other
//! character, byte order of encoded keys equals tuple order.
//!
//! ## Example
//!
//! ```rust
//! use ledgerbook_core::KeyCodec;
//!
//! let codec = KeyCodec::default();
//! let key = codec.encode("username~all", &["alice", "bank", "100"]).unwrap();
//! let decoded = codec.decode(&key).unwrap();
//! assert_eq!(decoded.index_name, "username~all");
//! assert_eq!(decoded.attributes, vec!["alice", "bank", "100"]);
//! ```

use crate::error::{CoreError, CoreResult};

/// Highest Unicode scalar value. Reserved as the exclusive upper bound of
/// prefix scans, so it may not appear inside a segment.
pub const RANGE_SENTINEL: char = '\u{10FFFF}';

/// A decoded composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    /// Index namespace the key belongs to.
    pub index_name: String,
    /// Attribute tuple, in projection order.
    pub attributes: Vec<String>,
}

impl CompositeKey {
    /// Creates a composite key.
    pub fn new(index_name: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            attributes,
        }
    }
}

/// Builds and parses composite keys around a reserved separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCodec {
    separator: char,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new('\u{0}')
    }
}

impl KeyCodec {
    /// Creates a codec around `separator`.
    #[must_use]
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Returns the separator.
    #[must_use]
    pub const fn separator(&self) -> char {
        self.separator
    }

    fn check_segment(&self, what: &str, segment: &str) -> CoreResult<()> {
        if segment.contains(self.separator) {
            return Err(CoreError::encoding(format!(
                "{what} {segment:?} contains the key separator {:?}",
                self.separator
            )));
        }
        if segment.contains(RANGE_SENTINEL) {
            return Err(CoreError::encoding(format!(
                "{what} {segment:?} contains the reserved range sentinel"
            )));
        }
        Ok(())
    }

    /// Encodes an index name and a full attribute tuple.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] if the index name is empty, or if the
    /// name or any attribute contains the separator or the range sentinel.
    pub fn encode<S: AsRef<str>>(&self, index_name: &str, attributes: &[S]) -> CoreResult<String> {
        if index_name.is_empty() {
            return Err(CoreError::encoding("index name must not be empty"));
        }
        self.check_segment("index name", index_name)?;

        let capacity = 2
            + index_name.len()
            + attributes
                .iter()
                .map(|a| a.as_ref().len() + 1)
                .sum::<usize>();
        let mut key = String::with_capacity(capacity);
        key.push(self.separator);
        key.push_str(index_name);
        key.push(self.separator);
        for attribute in attributes {
            let attribute = attribute.as_ref();
            self.check_segment("attribute", attribute)?;
            key.push_str(attribute);
            key.push(self.separator);
        }
        Ok(key)
    }

    /// Encodes the leading part of a tuple for a prefix scan.
    ///
    /// The result is a prefix of every key whose first attributes equal
    /// `prefix`, and of no other key.
    pub fn encode_prefix<S: AsRef<str>>(
        &self,
        index_name: &str,
        prefix: &[S],
    ) -> CoreResult<String> {
        self.encode(index_name, prefix)
    }

    /// Returns the exclusive upper bound of a scan over `prefix`.
    #[must_use]
    pub fn range_end(&self, prefix: &str) -> String {
        let mut end = String::with_capacity(prefix.len() + RANGE_SENTINEL.len_utf8());
        end.push_str(prefix);
        end.push(RANGE_SENTINEL);
        end
    }

    /// Returns true if `key` lies in the composite key namespace.
    #[must_use]
    pub fn is_composite(&self, key: &str) -> bool {
        key.starts_with(self.separator)
    }

    /// Decodes a composite key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decoding`] if the key is not delimited by the
    /// separator or carries no index name.
    pub fn decode(&self, key: &str) -> CoreResult<CompositeKey> {
        let body = key
            .strip_prefix(self.separator)
            .and_then(|rest| rest.strip_suffix(self.separator))
            .ok_or_else(|| {
                CoreError::decoding(format!("{key:?} is not a separator-delimited composite key"))
            })?;

        let mut segments = body.split(self.separator);
        let index_name = match segments.next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(CoreError::decoding(format!("{key:?} has no index name"))),
        };
        let attributes = segments.map(str::to_string).collect();

        Ok(CompositeKey {
            index_name,
            attributes,
        })
    }

    /// Decodes a composite key that must carry exactly `arity` attributes.
    pub fn decode_expecting(&self, key: &str, arity: usize) -> CoreResult<CompositeKey> {
        let decoded = self.decode(key)?;
        if decoded.attributes.len() != arity {
            return Err(CoreError::decoding(format!(
                "index {} expects {arity} attributes, key carries {}",
                decoded.index_name,
                decoded.attributes.len()
            )));
        }
        Ok(decoded)
    }
}
