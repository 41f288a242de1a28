use super::{require_non_empty, require_numeric, unknown, Contract, FunctionSpec};
use crate::config::Config;
use crate::error::CoreResult;
use crate::records::registry::RegisteredCertificate;
use crate::store::RecordStore;
use ledgerbook_ledger::Ledger;
use serde::Serialize;
use serde_json::value::RawValue;

const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec::new("createCertificate", 2),
    FunctionSpec::new("updateCertificate", 2),
    FunctionSpec::new("queryCertificate", 1),
    FunctionSpec::new("removeCertificate", 1),
    FunctionSpec::new("queryHistoryCertificate", 1),
    FunctionSpec::new("queryAllCertificate", 0),
];

/// Certificate registry: numeric IDs bound to certificate hashes.
#[derive(Debug, Clone, Default)]
pub struct RegistryContract {
    config: Config,
}

impl RegistryContract {
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

#[derive(Serialize)]
struct KeyedRecord {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Record")]
    record: Box<RawValue>,
}

impl Contract for RegistryContract {
    fn name(&self) -> &'static str {
        "registry"
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
                require_numeric("CertificateID", &args[0])?;
                require_non_empty("CertificateHash", &args[1])?;
                store.create(&RegisteredCertificate::new(&args[0], &args[1]))?;
                Ok(None)
            }
            "updateCertificate" => {
                require_non_empty("CertificateID", &args[0])?;
                require_non_empty("CertificateHash", &args[1])?;
                let hash = args[1].clone();
                store.update(&args[0], move |mut entry: RegisteredCertificate| {
                    entry.certificate_hash = hash;
                    Ok(entry)
                })?;
                Ok(None)
            }
            "queryCertificate" => store.read_raw(&args[0]).map(Some),
            "removeCertificate" => {
                store.delete::<RegisteredCertificate>(&args[0])?;
                Ok(None)
            }
            "queryHistoryCertificate" => store.history(&args[0])?.render_json().map(Some),
            "queryAllCertificate" => {
                let rows = store
                    .scan("", "")?
                    .into_iter()
                    .map(|kv| -> CoreResult<KeyedRecord> {
                        Ok(KeyedRecord {
                            record: serde_json::from_slice(&kv.value)?,
                            key: kv.key,
                        })
                    })
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(Some(serde_json::to_vec(&rows)?))
            }
            _ => Err(unknown(function)),
        }
    }
}
