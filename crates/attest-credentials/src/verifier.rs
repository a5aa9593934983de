use attest_core::{Clock, CredentialStatus, VerificationCheck, VerificationReason, VerificationResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::canonical::CanonicalBytes;
use crate::credential::VerifiableCredential;
use crate::error::CredentialError;
use crate::proof::{Proof, ProofEngine};
use crate::store::CredentialStore;

const CHECK_EXISTS: &str = "exists";
const CHECK_NOT_REVOKED: &str = "not_revoked";
const CHECK_NOT_EXPIRED: &str = "not_expired";
const CHECK_SIGNATURE: &str = "signature_valid";

/// Decides whether a credential is valid right now.
///
/// Checks run in a fixed order and stop at the first failure: existence,
/// revocation, expiry, signature. Invalidity is reported in the result;
/// only store or key infrastructure faults are errors.
pub struct VerificationEngine {
    store: Arc<CredentialStore>,
    proofs: Arc<ProofEngine>,
    clock: Arc<dyn Clock>,
}

impl VerificationEngine {
    pub fn new(store: Arc<CredentialStore>, proofs: Arc<ProofEngine>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            proofs,
            clock,
        }
    }

    /// Verify a stored credential by id.
    pub async fn verify(&self, credential_id: &str) -> Result<VerificationResult, CredentialError> {
        self.run(credential_id, None).await
    }

    /// Verify a presented document. The signature is checked over the
    /// document as presented; status and expiry come from the store.
    pub async fn verify_document(
        &self,
        document: &VerifiableCredential,
    ) -> Result<VerificationResult, CredentialError> {
        let bytes = document.credential.canonical_bytes()?;
        self.run(document.id(), Some((bytes, &document.proof))).await
    }

    async fn run(
        &self,
        credential_id: &str,
        presented: Option<(CanonicalBytes, &Proof)>,
    ) -> Result<VerificationResult, CredentialError> {
        let now = self.clock.now();
        let mut checks = Vec::with_capacity(4);

        let record = match self.store.get(credential_id).await {
            Ok(record) => {
                checks.push(VerificationCheck::pass(CHECK_EXISTS));
                record
            }
            Err(CredentialError::NotFound(_)) => {
                checks.push(VerificationCheck::fail(CHECK_EXISTS, "no credential with this id"));
                return Ok(finish(
                    credential_id,
                    VerificationReason::UnknownCredential,
                    now,
                    checks,
                ));
            }
            Err(e) => return Err(e),
        };

        if record.status == CredentialStatus::Revoked {
            let detail = match &record.revocation {
                Some(r) => format!("revoked at {}: {}", r.revoked_at, r.reason),
                None => "revoked".to_string(),
            };
            checks.push(VerificationCheck::fail(CHECK_NOT_REVOKED, detail));
            return Ok(finish(credential_id, VerificationReason::Revoked, now, checks));
        }
        checks.push(VerificationCheck::pass(CHECK_NOT_REVOKED));

        if self.store.is_record_expired(&record, now) {
            checks.push(VerificationCheck::fail(CHECK_NOT_EXPIRED, "validity window elapsed"));
            return Ok(finish(credential_id, VerificationReason::Expired, now, checks));
        }
        checks.push(VerificationCheck::pass(CHECK_NOT_EXPIRED));

        let signature_ok = match presented {
            Some((bytes, proof)) => self.proofs.verify(&bytes, proof)?,
            None => self
                .proofs
                .verify(&record.credential.canonical_bytes()?, &record.proof)?,
        };
        if !signature_ok {
            checks.push(VerificationCheck::fail(
                CHECK_SIGNATURE,
                "proof does not match the document",
            ));
            return Ok(finish(credential_id, VerificationReason::InvalidSignature, now, checks));
        }
        checks.push(VerificationCheck::pass(CHECK_SIGNATURE));

        Ok(finish(credential_id, VerificationReason::None, now, checks))
    }
}

fn finish(
    credential_id: &str,
    reason: VerificationReason,
    verified_at: DateTime<Utc>,
    checks: Vec<VerificationCheck>,
) -> VerificationResult {
    let result = VerificationResult::from_checks(credential_id, reason, verified_at, checks);
    tracing::info!(
        credential_id = %credential_id,
        valid = result.valid,
        reason = %result.reason,
        "credential verified"
    );
    result
}
