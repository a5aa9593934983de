use attest_core::{SubjectClaims, BASE_CREDENTIAL_TYPE};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::CanonicalBytes;
use crate::error::CredentialError;
use crate::proof::Proof;

/// Subject of a permit credential: the holder plus the approved-permit claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    /// Holder identity (DID or other identifier).
    pub id: String,
    /// Permit claims, flattened next to `id` on the wire.
    #[serde(flatten)]
    pub claims: SubjectClaims,
}

/// An unsigned permit credential document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// JSON-LD contexts, in order.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// Unique credential identifier.
    pub id: String,
    /// Type tags; the first is always `VerifiableCredential`.
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    /// Issuer identity.
    pub issuer: String,
    /// When the credential was issued (whole seconds, UTC).
    #[serde(rename = "issuanceDate")]
    pub issuance_date: DateTime<Utc>,
    /// Holder and permit claims.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,
}

impl Credential {
    /// Canonical signing input: every field except the proof, in the order
    /// context, id, type, issuer, issuanceDate, subject. Sub-second digits
    /// of `issuanceDate` are kept so no part of the timestamp is unsigned.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CredentialError> {
        let mut subject = self.credential_subject.claims.clone();
        subject.insert("id".into(), Value::String(self.credential_subject.id.clone()));

        CanonicalBytes::from_ordered_fields(&[
            ("@context", string_array(&self.context)),
            ("id", Value::String(self.id.clone())),
            ("type", string_array(&self.credential_type)),
            ("issuer", Value::String(self.issuer.clone())),
            (
                "issuanceDate",
                Value::String(
                    self.issuance_date
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                ),
            ),
            ("credentialSubject", Value::Object(subject)),
        ])
        .map_err(CredentialError::from)
    }

    /// Holder identity.
    pub fn holder(&self) -> &str {
        &self.credential_subject.id
    }

    /// Permit claims.
    pub fn claims(&self) -> &SubjectClaims {
        &self.credential_subject.claims
    }

    /// Whether the credential carries the given type tag.
    pub fn has_type(&self, tag: &str) -> bool {
        self.credential_type.iter().any(|t| t == tag)
    }

    /// Type tags beyond the base type.
    pub fn specific_types(&self) -> impl Iterator<Item = &str> {
        self.credential_type
            .iter()
            .map(String::as_str)
            .filter(|t| *t != BASE_CREDENTIAL_TYPE)
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// A credential with its attached proof, as handed to holders and verifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    #[serde(flatten)]
    pub credential: Credential,
    pub proof: Proof,
}

impl VerifiableCredential {
    pub fn new(credential: Credential, proof: Proof) -> Self {
        Self { credential, proof }
    }

    pub fn id(&self) -> &str {
        &self.credential.id
    }
}
