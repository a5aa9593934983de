use attest_core::{
    Clock, EngineConfig, SubjectClaims, BASE_CREDENTIAL_TYPE, RESERVED_CLAIM_KEYS,
};
use chrono::SubsecRound;
use std::sync::Arc;

use crate::credential::{Credential, CredentialSubject};
use crate::error::CredentialError;
use crate::validity::ValidityPolicy;

/// Source of fresh credential identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Time-ordered UUID v7 identifiers in `urn:uuid:` form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> String {
        format!("urn:uuid:{}", uuid::Uuid::now_v7())
    }
}

/// Assembles unsigned permit credentials from approved-permit claims.
pub struct CredentialBuilder {
    contexts: Vec<String>,
    default_types: Vec<String>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    validity: Arc<ValidityPolicy>,
}

impl CredentialBuilder {
    /// Create a builder with UUID v7 identifiers.
    pub fn new(config: &EngineConfig, clock: Arc<dyn Clock>, validity: Arc<ValidityPolicy>) -> Self {
        Self {
            contexts: config.contexts.clone(),
            default_types: config.default_types.clone(),
            ids: Arc::new(UuidV7Generator),
            clock,
            validity,
        }
    }

    /// Replace the identifier source.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Build an unsigned credential.
    ///
    /// `types` are added after `VerifiableCredential`; when empty, the
    /// configured default types are used. Duplicates are dropped.
    pub fn build(
        &self,
        claims: SubjectClaims,
        issuer: &str,
        holder: &str,
        types: &[String],
    ) -> Result<Credential, CredentialError> {
        if issuer.trim().is_empty() {
            return Err(CredentialError::Validation("issuer must not be empty".into()));
        }
        if holder.trim().is_empty() {
            return Err(CredentialError::Validation("holder must not be empty".into()));
        }
        if claims.is_empty() {
            return Err(CredentialError::Validation(
                "subject claims must not be empty".into(),
            ));
        }
        if let Some(key) = RESERVED_CLAIM_KEYS.iter().find(|k| claims.contains_key(**k)) {
            return Err(CredentialError::Validation(format!(
                "claim key '{}' is reserved",
                key
            )));
        }

        let requested = if types.is_empty() {
            &self.default_types
        } else {
            types
        };
        let mut credential_type = vec![BASE_CREDENTIAL_TYPE.to_string()];
        for tag in requested {
            if tag.trim().is_empty() {
                return Err(CredentialError::Validation("type tag must not be empty".into()));
            }
            if !credential_type.contains(tag) {
                credential_type.push(tag.clone());
            }
        }

        let credential = Credential {
            context: self.contexts.clone(),
            id: self.ids.next_id(),
            credential_type,
            issuer: issuer.to_string(),
            issuance_date: self.clock.now().trunc_subsecs(0),
            credential_subject: CredentialSubject {
                id: holder.to_string(),
                claims,
            },
        };

        // Reject end dates that verification could never read.
        self.validity.expires_at(&credential)?;

        tracing::debug!(
            credential_id = %credential.id,
            issuer = %credential.issuer,
            holder = %credential.credential_subject.id,
            "credential built"
        );

        Ok(credential)
    }
}
