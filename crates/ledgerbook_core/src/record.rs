//! Record trait for typed ledger entries.

use crate::error::CoreResult;
use crate::types::IndexDef;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types stored as records in the ledger.
///
/// Implementors provide:
/// - `primary_key()`: the stable key the record lives under
/// - `indexes()`: the composite indexes maintained for the type
/// - `projection()`: the attribute tuple of the record for one index
///
/// Records are serialized as flat JSON objects with fields in declaration
/// order, so identical records produce identical bytes.
///
/// # Example
///
/// ```rust
/// use ledgerbook_core::{IndexDef, Record};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Badge {
///     id: String,
///     owner: String,
/// }
///
/// const BY_OWNER: IndexDef = IndexDef::new("owner~badge", &["owner", "id"]);
///
/// impl Record for Badge {
///     const KIND: &'static str = "Badge";
///
///     fn primary_key(&self) -> String {
///         format!("Badge_{}", self.id)
///     }
///
///     fn indexes() -> &'static [IndexDef] {
///         &[BY_OWNER]
///     }
///
///     fn projection(&self, _index: &IndexDef) -> Vec<String> {
///         vec![self.owner.clone(), self.id.clone()]
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned {
    /// Type name used in logs.
    const KIND: &'static str;

    /// Returns the primary key of this record.
    ///
    /// The key must not change across updates.
    fn primary_key(&self) -> String;

    /// Returns the indexes maintained for this record type.
    fn indexes() -> &'static [IndexDef] {
        &[]
    }

    /// Returns this record's attribute tuple for `index`.
    ///
    /// The tuple length must equal `index.arity()`.
    fn projection(&self, _index: &IndexDef) -> Vec<String> {
        Vec::new()
    }

    /// Returns every `(index, tuple)` pair of this record.
    fn projections(&self) -> Vec<(IndexDef, Vec<String>)> {
        Self::indexes()
            .iter()
            .map(|index| (*index, self.projection(index)))
            .collect()
    }

    /// Serializes the record to JSON bytes.
    fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes a record from JSON bytes.
    fn decode(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
