//! # ledgerbook Core
//!
//! Typed records, secondary indexes and audit history on top of an
//! append-only key-value [`Ledger`](ledgerbook_ledger::Ledger).
//!
//! The ledger only knows point reads, point writes, ordered range scans and
//! per-key history. This crate layers on top of it:
//!
//! - [`RecordStore`]: JSON records under primary keys, with index upkeep
//! - [`Index`]: secondary indexes emulated with composite keys
//! - [`HistoryReader`]: per-record audit trail
//! - [`query_rows`]: prefix queries answered from index keys alone
//! - [`contract`]: named operations over positional string arguments
//!
//! ## Example
//!
//! ```rust
//! use ledgerbook_core::contract::{Contract, LoyaltyContract};
//! use ledgerbook_ledger::InMemoryLedger;
//!
//! let mut ledger = InMemoryLedger::new();
//! let contract = LoyaltyContract::default();
//! let args = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
//!
//! ledger.begin_transaction();
//! contract.invoke(&mut ledger, "initIntegral", &args(&["alice", "bank", "100", ""])).unwrap();
//! ledger.begin_transaction();
//! let transfer = args(&["alice", "bank", "telecom", "30"]);
//! contract.invoke(&mut ledger, "convertIntegral", &transfer).unwrap();
//!
//! let rows = contract
//!     .invoke(&mut ledger, "queryIntegralBasedOnUser", &args(&["alice"]))
//!     .unwrap()
//!     .unwrap();
//! assert!(String::from_utf8(rows).unwrap().contains(r#""integralCount":"60""#));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod contract;
mod error;
mod history;
mod index;
mod key;
mod query;
mod record;
pub mod records;
mod store;
mod types;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use history::{EntryIter, HistoryEntry, HistoryReader, ValueProjection};
pub use index::{CompositeKeyIndex, Index};
pub use key::{CompositeKey, KeyCodec, RANGE_SENTINEL};
pub use query::{query_rows, render_rows, IndexProjection, PrefixScan};
pub use record::Record;
pub use store::RecordStore;
pub use types::{IndexDef, Points};
