use super::{require_non_empty, unknown, Contract, FunctionSpec};
use crate::config::Config;
use crate::error::CoreResult;
use crate::query::render_rows;
use crate::records::loyalty::{self, Balance, BalanceRow, Category};
use crate::store::RecordStore;
use crate::types::Points;
use ledgerbook_ledger::Ledger;

const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec::new("initIntegral", 4),
    FunctionSpec::new("addIntegral", 3),
    FunctionSpec::new("convertIntegral", 4),
    FunctionSpec::new("queryIntegral", 2),
    FunctionSpec::new("queryHistoryIntegral", 2),
    FunctionSpec::new("queryIntegralBasedOnUser", 1),
];

/// Loyalty point balances per user and category.
#[derive(Debug, Clone, Default)]
pub struct LoyaltyContract {
    config: Config,
}

impl LoyaltyContract {
    /// Creates the contract.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::DomainConstraint`] if `config` cannot produce
    /// well-formed index entries.
    pub fn new(config: Config) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    fn identity(&self, value: &str) -> String {
        if self.config.lowercase_identities {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }

    fn user(&self, field: &str, value: &str) -> CoreResult<String> {
        require_non_empty(field, value)?;
        Ok(self.identity(value))
    }

    fn category(&self, field: &str, value: &str) -> CoreResult<Category> {
        require_non_empty(field, value)?;
        self.identity(value).parse()
    }
}

impl Contract for LoyaltyContract {
    fn name(&self) -> &'static str {
        "loyalty"
    }

    fn functions(&self) -> &'static [FunctionSpec] {
        FUNCTIONS
    }

    fn dispatch(
        &self,
        ledger: &mut dyn Ledger,
        function: &str,
        args: &[String],
    ) -> CoreResult<Option<Vec<u8>>> {
        let mut store = RecordStore::new(ledger, &self.config);
        match function {
            "initIntegral" => {
                let user = self.user("userName", &args[0])?;
                let category = self.category("enterpriseName", &args[1])?;
                let count = Points::parse("integralCount", &args[2])?;
                loyalty::open(&mut store, &user, category, count, Some(args[3].as_str()))?;
                Ok(None)
            }
            "addIntegral" => {
                let user = self.user("userName", &args[0])?;
                let category = self.category("enterpriseName", &args[1])?;
                require_non_empty("integralCount", &args[2])?;
                let amount = Points::parse("integralCount", &args[2])?;
                loyalty::credit(&mut store, &user, category, amount)?;
                Ok(None)
            }
            "convertIntegral" => {
                let user = self.user("userName", &args[0])?;
                let from = self.category("origEnterpriseName", &args[1])?;
                let to = self.category("targetEnterpriseName", &args[2])?;
                let amount = Points::parse("integralCount", &args[3])?;
                loyalty::transfer(&mut store, &user, from, to, amount)?;
                Ok(None)
            }
            "queryIntegral" => {
                let user = self.user("userName", &args[0])?;
                let category = self.category("enterpriseName", &args[1])?;
                store.read_raw(&Balance::key_for(&user, category)).map(Some)
            }
            "queryHistoryIntegral" => {
                let user = self.user("userName", &args[0])?;
                let category = self.category("enterpriseName", &args[1])?;
                store
                    .history(&Balance::key_for(&user, category))?
                    .render_json()
                    .map(Some)
            }
            "queryIntegralBasedOnUser" => {
                let user = self.user("userName", &args[0])?;
                let rows: Vec<BalanceRow> = store.query_rows(&[user])?;
                render_rows(&rows).map(Some)
            }
            _ => Err(unknown(function)),
        }
    }
}
