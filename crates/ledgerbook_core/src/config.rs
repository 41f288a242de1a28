//! Record layer configuration.

use crate::error::{CoreError, CoreResult};
use crate::key::RANGE_SENTINEL;

/// Configuration shared by every contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Separator between composite key segments. Attribute values must
    /// never contain it.
    pub key_separator: char,

    /// Value stored under every index entry. Must not be empty: ledgers
    /// read an empty value as a deletion.
    pub index_marker: Vec<u8>,

    /// Whether loyalty identities (user and category) are lower-cased
    /// before keys are built.
    pub lowercase_identities: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_separator: '\u{0}',
            index_marker: vec![0x00],
            lowercase_identities: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the composite key separator.
    #[must_use]
    pub const fn key_separator(mut self, separator: char) -> Self {
        self.key_separator = separator;
        self
    }

    /// Sets the index entry marker value.
    #[must_use]
    pub fn index_marker(mut self, marker: impl Into<Vec<u8>>) -> Self {
        self.index_marker = marker.into();
        self
    }

    /// Sets whether loyalty identities are lower-cased.
    #[must_use]
    pub const fn lowercase_identities(mut self, value: bool) -> Self {
        self.lowercase_identities = value;
        self
    }

    /// Checks that the configuration can produce well-formed keys.
    pub fn validate(&self) -> CoreResult<()> {
        if self.index_marker.is_empty() {
            return Err(CoreError::domain_constraint("index marker must not be empty"));
        }
        if self.key_separator == RANGE_SENTINEL {
            return Err(CoreError::domain_constraint(
                "key separator must differ from the range sentinel",
            ));
        }
        Ok(())
    }
}
