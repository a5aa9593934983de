//! Ed25519 proofs over canonical credential bytes.

use attest_core::Clock;
use attest_crypto::{verify, PublicKey, Signature, SigningKeyProvider, VerificationKeyResolver};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::canonical::CanonicalBytes;
use crate::error::CredentialError;

/// Proof suite written on every credential.
pub const PROOF_TYPE: &str = "Ed25519Signature2020";

/// Purpose the issuer signs for.
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Detached proof attached to a verifiable credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    /// Key id of the signing key, `{issuer}#{fingerprint}`.
    pub verification_method: String,
    pub proof_purpose: String,
    /// Base64 Ed25519 signature over the canonical bytes.
    pub proof_value: String,
}

/// Signs and verifies credential proofs.
///
/// Signing goes through the configured key provider; verification resolves
/// the key named in the proof, so credentials signed by a retired key still
/// verify while that key stays registered.
pub struct ProofEngine {
    signer: Arc<dyn SigningKeyProvider>,
    resolver: Arc<dyn VerificationKeyResolver>,
    key_id: String,
    clock: Arc<dyn Clock>,
}

impl ProofEngine {
    pub fn new(
        signer: Arc<dyn SigningKeyProvider>,
        resolver: Arc<dyn VerificationKeyResolver>,
        key_id: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            signer,
            resolver,
            key_id: key_id.into(),
            clock,
        }
    }

    /// Key id written into new proofs.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign canonical bytes with the current key.
    pub fn sign(&self, bytes: &CanonicalBytes) -> Result<Proof, CredentialError> {
        let signature = self.signer.sign(bytes.as_bytes()).map_err(|e| {
            tracing::error!(
                provider = self.signer.provider_name(),
                error = %e,
                "signing failed"
            );
            CredentialError::SignatureInfrastructure(e.to_string())
        })?;

        Ok(Proof {
            proof_type: PROOF_TYPE.to_string(),
            created: self.clock.now().trunc_subsecs(0),
            verification_method: self.key_id.clone(),
            proof_purpose: PROOF_PURPOSE.to_string(),
            proof_value: signature.to_base64(),
        })
    }

    /// Check a proof against canonical bytes.
    ///
    /// `Ok(false)` for anything wrong with the proof itself (unknown key,
    /// wrong suite, malformed or non-matching signature). `Err` only when
    /// the key lookup fails.
    pub fn verify(&self, bytes: &CanonicalBytes, proof: &Proof) -> Result<bool, CredentialError> {
        let key = self
            .resolver
            .resolve(&proof.verification_method)
            .map_err(|e| CredentialError::SignatureInfrastructure(e.to_string()))?;

        match key {
            Some(key) => Ok(Self::verify_with_key(bytes, proof, &key)),
            None => {
                tracing::debug!(
                    verification_method = %proof.verification_method,
                    "unknown verification method"
                );
                Ok(false)
            }
        }
    }

    /// Check a proof against an explicit public key.
    pub fn verify_with_key(bytes: &CanonicalBytes, proof: &Proof, key: &PublicKey) -> bool {
        if proof.proof_type != PROOF_TYPE {
            return false;
        }
        match Signature::from_base64(&proof.proof_value) {
            Ok(signature) => verify(bytes.as_bytes(), &signature, key).is_ok(),
            Err(_) => false,
        }
    }
}
