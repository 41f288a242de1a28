//! Core type definitions for ledgerbook.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaration of one composite index over a record type.
///
/// `fields` names the projected record fields in key order. The first
/// field is the one prefix scans filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexDef {
    /// Index namespace. Must be unique across all record types.
    pub name: &'static str,
    /// Projected field names, in key order.
    pub fields: &'static [&'static str],
}

impl IndexDef {
    /// Creates an index declaration.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [&'static str]) -> Self {
        Self { name, fields }
    }

    /// Returns the number of attributes every key of this index carries.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.fields.len()
    }
}

/// An integer point balance.
///
/// Carried as a plain integer inside records. At the invocation boundary
/// it is parsed from, and formatted back to, canonical decimal text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(pub i64);

impl Points {
    /// Creates a balance.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns true if the balance is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal integer supplied for `field`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFieldValue`] if `text` is not an integer
    /// in the `i64` range.
    pub fn parse(field: &str, text: &str) -> CoreResult<Self> {
        text.parse::<i64>()
            .map(Self)
            .map_err(|e| {
                CoreError::invalid_field(field, format!("{text:?} is not an integer: {e}"))
            })
    }

    /// Adds two balances.
    pub fn checked_add(self, other: Self) -> CoreResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| CoreError::invalid_field("integralCount", "balance overflow"))
    }

    /// Subtracts `other` from this balance.
    pub fn checked_sub(self, other: Self) -> CoreResult<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| CoreError::invalid_field("integralCount", "balance overflow"))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_def_arity() {
        const DEF: IndexDef = IndexDef::new("idx", &["a", "b", "c"]);
        assert_eq!(DEF.arity(), 3);
    }

    #[test]
    fn points_parse_canonicalises() {
        assert_eq!(Points::parse("n", "+042").unwrap().to_string(), "42");
        assert_eq!(Points::parse("n", "-7").unwrap(), Points::new(-7));
    }

    #[test]
    fn points_parse_rejects_text() {
        assert!(matches!(
            Points::parse("integralCount", "ten"),
            Err(CoreError::InvalidFieldValue { .. })
        ));
        assert!(Points::parse("n", "").is_err());
        assert!(Points::parse("n", " 1").is_err());
    }

    #[test]
    fn points_arithmetic() {
        let p = Points::new(100);
        assert_eq!(p.checked_sub(Points::new(130)).unwrap(), Points::new(-30));
        assert!(Points::new(-30).is_negative());
        assert!(Points::new(i64::MAX).checked_add(Points::new(1)).is_err());
    }

    #[test]
    fn points_serialize_as_integer() {
        let json = serde_json::to_string(&Points::new(5)).unwrap();
        assert_eq!(json, "5");
    }
}
