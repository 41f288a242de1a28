//! Invocation surface.
//!
//! A contract exposes named functions taking positional string arguments
//! and returning an optional JSON payload. Argument counts are checked
//! against the contract's function table before the ledger is touched.

mod certificate;
mod loyalty;
mod marathon;
mod registry;

pub use certificate::CertificateContract;
pub use loyalty::LoyaltyContract;
pub use marathon::MarathonContract;
pub use registry::RegistryContract;

use crate::error::{CoreError, CoreResult};
use ledgerbook_ledger::Ledger;
use tracing::warn;

/// Name and exact argument count of one contract function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    /// Function name as invoked.
    pub name: &'static str,
    /// Number of positional arguments.
    pub arity: usize,
}

impl FunctionSpec {
    /// Declares a function.
    #[must_use]
    pub const fn new(name: &'static str, arity: usize) -> Self {
        Self { name, arity }
    }
}

/// A set of named operations over one ledger.
pub trait Contract {
    /// Contract name used in logs.
    fn name(&self) -> &'static str;

    /// The functions this contract serves.
    fn functions(&self) -> &'static [FunctionSpec];

    /// Runs a function whose name and argument count were already checked.
    fn dispatch(
        &self,
        ledger: &mut dyn Ledger,
        function: &str,
        args: &[String],
    ) -> CoreResult<Option<Vec<u8>>>;

    /// Invokes `function` with `args`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownFunction`] if the contract has no such function
    /// - [`CoreError::InvalidArgumentCount`] on an arity mismatch
    /// - Any error raised by the function itself
    fn invoke(
        &self,
        ledger: &mut dyn Ledger,
        function: &str,
        args: &[String],
    ) -> CoreResult<Option<Vec<u8>>> {
        let result = check_arity(self.functions(), function, args)
            .and_then(|()| self.dispatch(ledger, function, args));
        if let Err(e) = &result {
            warn!(contract = self.name(), function, error = %e, "invocation rejected");
        }
        result
    }
}

fn check_arity(functions: &[FunctionSpec], function: &str, args: &[String]) -> CoreResult<()> {
    let spec = functions
        .iter()
        .find(|spec| spec.name == function)
        .ok_or_else(|| CoreError::UnknownFunction {
            function: function.to_string(),
        })?;
    if spec.arity != args.len() {
        return Err(CoreError::invalid_argument_count(function, spec.arity, args.len()));
    }
    Ok(())
}

fn unknown(function: &str) -> CoreError {
    CoreError::UnknownFunction {
        function: function.to_string(),
    }
}

/// Rejects an empty argument.
fn require_non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.is_empty() {
        return Err(CoreError::invalid_field(field, "must be a non-empty string"));
    }
    Ok(())
}

/// Rejects an argument that is not a decimal integer.
fn require_numeric(field: &str, value: &str) -> CoreResult<()> {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::invalid_field(field, format!("{value:?} is not numeric")));
    }
    Ok(())
}
