//! Certificate registry entries: a numeric ID bound to a certificate hash.

use crate::record::Record;
use crate::types::IndexDef;
use serde::{Deserialize, Serialize};

/// Registry entries by ID.
pub const REGISTRY_BY_ID: IndexDef = IndexDef::new("id~all", &["CertificateID", "CertificateHash"]);

/// A registered certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredCertificate {
    /// Numeric certificate ID, also the primary key.
    #[serde(rename = "CertificateID")]
    pub certificate_id: String,
    /// Hash of the certificate document.
    #[serde(rename = "CertificateHash")]
    pub certificate_hash: String,
}

impl RegisteredCertificate {
    /// Creates a registry entry.
    pub fn new(certificate_id: impl Into<String>, certificate_hash: impl Into<String>) -> Self {
        Self {
            certificate_id: certificate_id.into(),
            certificate_hash: certificate_hash.into(),
        }
    }
}

impl Record for RegisteredCertificate {
    const KIND: &'static str = "RegisteredCertificate";

    fn primary_key(&self) -> String {
        self.certificate_id.clone()
    }

    fn indexes() -> &'static [IndexDef] {
        &[REGISTRY_BY_ID]
    }

    fn projection(&self, _index: &IndexDef) -> Vec<String> {
        vec![self.certificate_id.clone(), self.certificate_hash.clone()]
    }
}
