//! Partner certificates, keyed by certificate hash and indexed by partner.

use crate::error::CoreResult;
use crate::query::IndexProjection;
use crate::record::Record;
use crate::records::marathon::positional;
use crate::types::IndexDef;
use serde::{Deserialize, Serialize};

/// Certificates by partner name. The tuple carries every field so partner
/// queries answer from the index alone.
pub const CERTIFICATE_BY_PARTNER: IndexDef = IndexDef::new(
    "partnername~all",
    &[
        "PartnerName",
        "CertificateHash",
        "Contacts",
        "Mobile",
        "Email",
        "CertificateType",
        "CertificateName",
        "PassingDate",
        "ExpiryDate",
        "CertificateStatus",
        "Participant",
        "Score",
    ],
);

/// A certificate issued to a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Certificate {
    /// Content hash, also the primary key.
    pub certificate_hash: String,
    /// Partner the certificate was issued to.
    pub partner_name: String,
    /// Contact person.
    pub contacts: String,
    /// Contact phone.
    pub mobile: String,
    /// Contact email.
    pub email: String,
    /// Certificate type.
    pub certificate_type: String,
    /// Certificate title.
    pub certificate_name: String,
    /// Date the exam was passed.
    pub passing_date: String,
    /// Date the certificate expires.
    pub expiry_date: String,
    /// Certificate status.
    pub certificate_status: String,
    /// Certified participant.
    pub participant: String,
    /// Exam score.
    pub score: String,
}

impl Certificate {
    /// Number of positional arguments a certificate is built from.
    pub const FIELD_COUNT: usize = 12;

    /// Builds a certificate from its twelve positional arguments, hash first.
    pub fn from_args(args: &[String]) -> CoreResult<Self> {
        let [
            certificate_hash,
            partner_name,
            contacts,
            mobile,
            email,
            certificate_type,
            certificate_name,
            passing_date,
            expiry_date,
            certificate_status,
            participant,
            score,
        ] = positional(args)?;
        Ok(Self {
            certificate_hash,
            partner_name,
            contacts,
            mobile,
            email,
            certificate_type,
            certificate_name,
            passing_date,
            expiry_date,
            certificate_status,
            participant,
            score,
        })
    }
}

impl Record for Certificate {
    const KIND: &'static str = "Certificate";

    fn primary_key(&self) -> String {
        self.certificate_hash.clone()
    }

    fn indexes() -> &'static [IndexDef] {
        &[CERTIFICATE_BY_PARTNER]
    }

    fn projection(&self, _index: &IndexDef) -> Vec<String> {
        vec![
            self.partner_name.clone(),
            self.certificate_hash.clone(),
            self.contacts.clone(),
            self.mobile.clone(),
            self.email.clone(),
            self.certificate_type.clone(),
            self.certificate_name.clone(),
            self.passing_date.clone(),
            self.expiry_date.clone(),
            self.certificate_status.clone(),
            self.participant.clone(),
            self.score.clone(),
        ]
    }
}

impl IndexProjection for Certificate {
    const INDEX: IndexDef = CERTIFICATE_BY_PARTNER;

    fn from_attributes(attributes: Vec<String>) -> CoreResult<Self> {
        let [
            partner_name,
            certificate_hash,
            contacts,
            mobile,
            email,
            certificate_type,
            certificate_name,
            passing_date,
            expiry_date,
            certificate_status,
            participant,
            score,
        ] = positional(&attributes)?;
        Ok(Self {
            certificate_hash,
            partner_name,
            contacts,
            mobile,
            email,
            certificate_type,
            certificate_name,
            passing_date,
            expiry_date,
            certificate_status,
            participant,
            score,
        })
    }
}
