//! # ledgerbook Ledger
//!
//! The ledger abstraction that ledgerbook records are persisted into.
//!
//! A ledger is an **append-only key-value store of record**. Its consensus,
//! replication and durability are somebody else's problem: this crate only
//! describes the primitives the record layer consumes.
//!
//! ## Design Principles
//!
//! - Values are opaque bytes; the ledger never interprets them
//! - Every `put`/`delete` is remembered in the key's history
//! - Range scans are half-open and ordered by key bytes
//! - Implementations must be `Send + Sync`
//!
//! ## Available Ledgers
//!
//! - [`InMemoryLedger`] - For testing and embedding
//!
//! ## Example
//!
//! ```rust
//! use ledgerbook_ledger::{InMemoryLedger, Ledger};
//!
//! let mut ledger = InMemoryLedger::new();
//! ledger.begin_transaction();
//! ledger.put("alice-bank", b"{}").unwrap();
//! assert_eq!(ledger.get("alice-bank").unwrap(), Some(b"{}".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod ledger;
mod memory;
mod types;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{HistoryIter, Ledger, RangeIter};
pub use memory::InMemoryLedger;
pub use types::{HistoryRecord, KeyValue, Timestamp, TxId};
