//! # ledgerbook Testkit
//!
//! Test utilities for ledgerbook.
//!
//! This crate provides:
//! - Ledger fixtures that open one transaction per invocation
//! - Property-based test generators using proptest
//! - An index audit comparing index entries with live records
//! - Tracing initialisation for tests
//!
//! ## Usage
//!
//! ```rust
//! use ledgerbook_core::contract::LoyaltyContract;
//! use ledgerbook_testkit::prelude::*;
//!
//! with_ledger(|ledger| {
//!     let contract = LoyaltyContract::default();
//!     ledger.invoke(&contract, "initIntegral", &["alice", "bank", "100", ""]).unwrap();
//!     let balance = ledger.invoke_json(&contract, "queryIntegral", &["alice", "bank"]);
//!     assert_eq!(balance["integralCount"], 100);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod fixtures;
pub mod generators;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audit::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::init_tracing;
}

pub use audit::*;
pub use fixtures::*;
pub use generators::*;

static TRACING: Once = Once::new();

/// Installs a fmt subscriber writing to the test harness.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Safe to call
/// from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
