use super::{require_non_empty, unknown, Contract, FunctionSpec};
use crate::config::Config;
use crate::error::CoreResult;
use crate::query::render_rows;
use crate::records::certificate::Certificate;
use crate::store::RecordStore;
use ledgerbook_ledger::Ledger;

const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec::new("createCertificate", Certificate::FIELD_COUNT),
    FunctionSpec::new("updateCertificate", Certificate::FIELD_COUNT),
    FunctionSpec::new("queryCertificate", 1),
    FunctionSpec::new("removeCertificate", 1),
    FunctionSpec::new("getHistoryForRecord", 1),
    FunctionSpec::new("queryCertificateBasedOnParterName", 1),
];

/// Partner certificates keyed by certificate hash.
#[derive(Debug, Clone, Default)]
pub struct CertificateContract {
    config: Config,
}

impl CertificateContract {
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
}

impl Contract for CertificateContract {
    fn name(&self) -> &'static str {
        "certificate"
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
            "createCertificate" => {
                require_non_empty("CertificateHash", &args[0])?;
                store.create(&Certificate::from_args(args)?)?;
                Ok(None)
            }
            "updateCertificate" => {
                require_non_empty("CertificateHash", &args[0])?;
                let certificate = Certificate::from_args(args)?;
                store.update(&args[0], move |_: Certificate| Ok(certificate))?;
                Ok(None)
            }
            "queryCertificate" => store.read_raw(&args[0]).map(Some),
            "removeCertificate" => {
                store.delete::<Certificate>(&args[0])?;
                Ok(None)
            }
            "getHistoryForRecord" => store.history(&args[0])?.render_json().map(Some),
            "queryCertificateBasedOnParterName" => {
                let rows: Vec<Certificate> = store.query_rows(&args[..1])?;
                render_rows(&rows).map(Some)
            }
            _ => Err(unknown(function)),
        }
    }
}
