//! Test fixtures and ledger helpers.
//!
//! Provides a ledger wrapper that runs every contract invocation in its
//! own transaction, as a real ledger would.

use ledgerbook_core::contract::Contract;
use ledgerbook_core::{Config, CoreResult, RecordStore};
use ledgerbook_ledger::InMemoryLedger;
use serde_json::Value;

/// An in-memory ledger plus the configuration contracts run with.
#[derive(Debug, Default)]
pub struct TestLedger {
    /// The ledger instance.
    pub ledger: InMemoryLedger,
    /// Configuration handed to stores opened by the fixture.
    pub config: Config,
}

impl TestLedger {
    /// Creates an empty ledger with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty ledger with `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            ledger: InMemoryLedger::new(),
            config,
        }
    }

    /// Invokes `function` in a fresh transaction.
    pub fn invoke<C: Contract + ?Sized>(
        &mut self,
        contract: &C,
        function: &str,
        args: &[&str],
    ) -> CoreResult<Option<Vec<u8>>> {
        self.ledger.begin_transaction();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        contract.invoke(&mut self.ledger, function, &args)
    }

    /// Invokes a query and parses its JSON payload.
    ///
    /// Panics if the invocation fails or returns nothing.
    pub fn invoke_json<C: Contract + ?Sized>(
        &mut self,
        contract: &C,
        function: &str,
        args: &[&str],
    ) -> Value {
        let payload = self
            .invoke(contract, function, args)
            .unwrap_or_else(|e| panic!("{function} failed: {e}"))
            .unwrap_or_else(|| panic!("{function} returned no payload"));
        serde_json::from_slice(&payload).expect("payload should be JSON")
    }

    /// Opens a record store in a fresh transaction.
    pub fn store(&mut self) -> RecordStore<'_> {
        self.ledger.begin_transaction();
        RecordStore::new(&mut self.ledger, &self.config)
    }
}

impl std::ops::Deref for TestLedger {
    type Target = InMemoryLedger;

    fn deref(&self) -> &Self::Target {
        &self.ledger
    }
}

impl std::ops::DerefMut for TestLedger {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ledger
    }
}

/// Runs a test against a fresh in-memory ledger.
pub fn with_ledger<F, R>(f: F) -> R
where
    F: FnOnce(&mut TestLedger) -> R,
{
    let mut ledger = TestLedger::new();
    f(&mut ledger)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use ledgerbook_core::contract::{LoyaltyContract, MarathonContract};

    /// Creates a ledger holding one bank balance per `(user, points)` pair.
    pub fn seeded_balances(balances: &[(&str, i64)]) -> TestLedger {
        let mut ledger = TestLedger::new();
        let contract = LoyaltyContract::default();
        for &(user, points) in balances {
            let points = points.to_string();
            ledger
                .invoke(&contract, "initIntegral", &[user, "bank", points.as_str(), ""])
                .expect("Failed to seed balance");
        }
        ledger
    }

    /// Creates a ledger holding `count` enrollments of `user_id`, numbered
    /// from `e0`.
    pub fn seeded_enrollments(user_id: &str, count: usize) -> TestLedger {
        let mut ledger = TestLedger::new();
        let contract = MarathonContract::default();
        for i in 0..count {
            let enrollment = format!("e{i}");
            let match_id = format!("m{i}");
            let score = (60 + i).to_string();
            ledger
                .invoke(
                    &contract,
                    "addMatchEnrollScoreInfo",
                    &[
                        enrollment.as_str(),
                        user_id,
                        match_id.as_str(),
                        "done",
                        "finished",
                        score.as_str(),
                    ],
                )
                .expect("Failed to seed enrollment");
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerbook_core::contract::LoyaltyContract;

    #[test]
    fn each_invocation_gets_a_transaction() {
        let mut ledger = TestLedger::new();
        let contract = LoyaltyContract::default();
        ledger.invoke(&contract, "initIntegral", &["a", "bank", "1", ""]).unwrap();
        let first = ledger.current_tx();
        ledger.invoke(&contract, "addIntegral", &["a", "bank", "1"]).unwrap();
        assert_ne!(first, ledger.current_tx());
    }

    #[test]
    fn seeded_balances_are_queryable() {
        let mut ledger = scenarios::seeded_balances(&[("alice", 10), ("bob", 20)]);
        let contract = LoyaltyContract::default();
        let bob = ledger.invoke_json(&contract, "queryIntegral", &["bob", "bank"]);
        assert_eq!(bob["integralCount"], 20);
    }

    #[test]
    fn with_ledger_runs_closure() {
        let len = with_ledger(|ledger| ledger.len());
        assert_eq!(len, 0);
    }
}
