//! Issuer-side facade wiring builder, proof engine, store, verifier and
//! presentation channel together. The node and the integration tests talk
//! to the engine only through [`CredentialService`].

use attest_core::{Clock, EngineConfig, SubjectClaims, VerificationResult};
use attest_crypto::{key_id_for, KeyRing, PublicKey, SigningKeyProvider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::builder::{CredentialBuilder, IdGenerator};
use crate::credential::{Credential, VerifiableCredential};
use crate::error::CredentialError;
use crate::presentation::{PresentationChannel, PresentationReference, VisualCode};
use crate::proof::ProofEngine;
use crate::store::{CredentialRecord, CredentialStore, StoreBackend};
use crate::validity::ValidityPolicy;
use crate::verifier::VerificationEngine;

const HOLDER_NAME_CLAIMS: [&str; 4] = ["holderName", "applicantName", "applicant", "name"];
const BUSINESS_NAME_CLAIMS: [&str; 2] = ["businessName", "tradeName"];
const PERMIT_TYPE_CLAIMS: [&str; 2] = ["permitType", "permit_type"];

/// Approved-permit fields to turn into a credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub subject_claims: SubjectClaims,
    /// Must match the configured issuer when present.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Holder identity; the configured default holder when absent.
    #[serde(default)]
    pub holder: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl IssueRequest {
    pub fn new(subject_claims: SubjectClaims) -> Self {
        Self {
            subject_claims,
            ..Default::default()
        }
    }

    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }
}

/// Human-facing fields shown to whoever scanned a presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySummary {
    pub holder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    pub issuer: String,
    pub issuance_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    /// `key: value` lines for every claim, in claim order.
    pub claims: Vec<String>,
}

impl DisplaySummary {
    pub fn from_credential(credential: &Credential, validity: &ValidityPolicy) -> Self {
        let claims = credential.claims();
        Self {
            holder: credential.holder().to_string(),
            holder_name: first_text(claims, &HOLDER_NAME_CLAIMS),
            permit_type: first_text(claims, &PERMIT_TYPE_CLAIMS),
            business_name: first_text(claims, &BUSINESS_NAME_CLAIMS),
            issuer: credential.issuer.clone(),
            issuance_date: credential.issuance_date,
            valid_until: validity.expires_at(credential).ok().flatten(),
            claims: claims
                .iter()
                .map(|(k, v)| format!("{}: {}", k, display_value(v)))
                .collect(),
        }
    }
}

fn first_text(claims: &SubjectClaims, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| claims.get(*k))
        .map(display_value)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome of resolving a scanned presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPresentation {
    pub credential_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<PresentationReference>,
    /// False once the code is past its horizon. Verification still runs.
    pub code_fresh: bool,
    pub verification: VerificationResult,
    /// Absent when the credential is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplaySummary>,
}

pub struct CredentialService {
    config: EngineConfig,
    issuer: String,
    keys: Arc<KeyRing>,
    validity: Arc<ValidityPolicy>,
    builder: CredentialBuilder,
    proofs: Arc<ProofEngine>,
    store: Arc<CredentialStore>,
    verifier: VerificationEngine,
    presentation: PresentationChannel,
    clock: Arc<dyn Clock>,
}

impl CredentialService {
    /// Wire the engine. The signer's current key is registered in `keys`
    /// under `{issuer}#{fingerprint}`.
    pub fn new(
        config: EngineConfig,
        signer: Arc<dyn SigningKeyProvider>,
        keys: Arc<KeyRing>,
        backend: Arc<dyn StoreBackend>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CredentialError> {
        config.validate()?;

        let public_key = signer
            .public_key()
            .map_err(|e| CredentialError::SignatureInfrastructure(e.to_string()))?;
        let issuer = config
            .issuer
            .clone()
            .unwrap_or_else(|| public_key.to_did_key());
        let key_id = key_id_for(&issuer, &public_key);
        keys.insert(key_id.clone(), public_key);

        let validity = Arc::new(ValidityPolicy::from_config(&config));
        let store = Arc::new(CredentialStore::new(
            backend,
            validity.clone(),
            Duration::from_millis(config.store_timeout_ms),
            clock.clone(),
        ));
        let proofs = Arc::new(ProofEngine::new(
            signer.clone(),
            keys.clone(),
            key_id.clone(),
            clock.clone(),
        ));
        let builder = CredentialBuilder::new(&config, clock.clone(), validity.clone());
        let verifier = VerificationEngine::new(store.clone(), proofs.clone(), clock.clone());
        let presentation = PresentationChannel::new(
            &config.verify_base_url,
            config.presentation_ttl_secs,
            clock.clone(),
        )?;

        tracing::info!(
            issuer = %issuer,
            key_id = %key_id,
            key_provider = signer.provider_name(),
            store = store.backend_name(),
            "credential service ready"
        );

        Ok(Self {
            config,
            issuer,
            keys,
            validity,
            builder,
            proofs,
            store,
            verifier,
            presentation,
            clock,
        })
    }

    /// Replace the credential id source.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.builder = self.builder.with_id_generator(ids);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn key_id(&self) -> &str {
        self.proofs.key_id()
    }

    pub fn store_backend(&self) -> &str {
        self.store.backend_name()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Keep a retired key verifiable. Registered under the current issuer
    /// and under its own `did:key` issuer id.
    pub fn register_retired_key(&self, key: PublicKey) {
        self.keys.insert(key_id_for(&self.issuer, &key), key.clone());
        self.keys.insert(key_id_for(&key.to_did_key(), &key), key);
    }

    /// Build, sign and persist a credential. Nothing is stored unless signing
    /// succeeded.
    pub async fn issue(&self, request: IssueRequest) -> Result<VerifiableCredential, CredentialError> {
        if let Some(requested) = request.issuer.as_deref() {
            if requested != self.issuer {
                return Err(CredentialError::Validation(format!(
                    "this service issues as {}, not {}",
                    self.issuer, requested
                )));
            }
        }
        let holder = request
            .holder
            .unwrap_or_else(|| self.config.default_holder.clone());

        let credential =
            self.builder
                .build(request.subject_claims, &self.issuer, &holder, &request.types)?;
        let proof = self.proofs.sign(&credential.canonical_bytes()?)?;
        self.store.put(credential.clone(), proof.clone()).await?;

        tracing::info!(
            credential_id = %credential.id,
            issuer = %credential.issuer,
            holder = %holder,
            "credential issued"
        );

        Ok(VerifiableCredential::new(credential, proof))
    }

    pub async fn verify(&self, credential_id: &str) -> Result<VerificationResult, CredentialError> {
        self.verifier.verify(credential_id).await
    }

    pub async fn verify_document(
        &self,
        document: &VerifiableCredential,
    ) -> Result<VerificationResult, CredentialError> {
        self.verifier.verify_document(document).await
    }

    pub async fn get(&self, credential_id: &str) -> Result<CredentialRecord, CredentialError> {
        self.store.get(credential_id).await
    }

    pub async fn revoke(
        &self,
        credential_id: &str,
        reason: &str,
    ) -> Result<CredentialRecord, CredentialError> {
        self.store.revoke(credential_id, reason).await
    }

    /// Presentation code for a stored credential. `NotFound` for unknown ids.
    pub async fn generate_presentation(
        &self,
        credential_id: &str,
    ) -> Result<VisualCode, CredentialError> {
        self.store.get(credential_id).await?;
        self.presentation.encode(credential_id)
    }

    /// Decode a scanned payload and re-verify the credential it points at.
    pub async fn resolve_presentation(
        &self,
        payload: &str,
    ) -> Result<ResolvedPresentation, CredentialError> {
        let reference = self.presentation.decode(payload)?;
        self.resolve_reference(reference).await
    }

    /// Re-verify the credential a reference points at.
    pub async fn resolve_reference(
        &self,
        reference: PresentationReference,
    ) -> Result<ResolvedPresentation, CredentialError> {
        let code_fresh = reference.is_fresh(self.clock.now());
        if !code_fresh {
            tracing::debug!(
                credential_id = %reference.credential_id,
                expired_at = %reference.expires_at,
                "stale presentation code scanned"
            );
        }
        self.resolve(reference.credential_id.clone(), Some(reference), code_fresh)
            .await
    }

    /// Resolve a bare credential id, as from a verification link without a
    /// code horizon.
    pub async fn resolve_credential(
        &self,
        credential_id: &str,
    ) -> Result<ResolvedPresentation, CredentialError> {
        self.resolve(credential_id.to_string(), None, true).await
    }

    async fn resolve(
        &self,
        credential_id: String,
        reference: Option<PresentationReference>,
        code_fresh: bool,
    ) -> Result<ResolvedPresentation, CredentialError> {
        let verification = self.verifier.verify(&credential_id).await?;
        let display = match self.store.get(&credential_id).await {
            Ok(record) => Some(DisplaySummary::from_credential(
                &record.credential,
                &self.validity,
            )),
            Err(CredentialError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(ResolvedPresentation {
            credential_id,
            reference,
            code_fresh,
            verification,
            display,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use attest_core::{ManualClock, VerificationReason};
    use attest_crypto::{KeyPair, LocalKeyProvider};
    use chrono::TimeZone;
    use serde_json::json;

    struct SameId;

    impl IdGenerator for SameId {
        fn next_id(&self) -> String {
            "urn:uuid:fixed".into()
        }
    }

    fn service_with(config: EngineConfig) -> (CredentialService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap(),
        ));
        let service = CredentialService::new(
            config,
            Arc::new(LocalKeyProvider::new(KeyPair::from_seed(&[1u8; 32]))),
            Arc::new(KeyRing::new()),
            Arc::new(InMemoryBackend::new()),
            clock.clone(),
        )
        .unwrap();
        (service, clock)
    }

    fn service() -> (CredentialService, Arc<ManualClock>) {
        service_with(EngineConfig::default())
    }

    fn permit() -> SubjectClaims {
        json!({
            "permitType": "FOOD_VENDOR",
            "applicantName": "Jane Doe",
            "businessName": "Jane's Tacos",
            "validUntil": "2025-01-15"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn test_issuer_defaults_to_did_key() {
        let (service, _) = service();
        let expected = KeyPair::from_seed(&[1u8; 32]).public_key().to_did_key();
        assert_eq!(service.issuer(), expected);
        assert!(service.key_id().starts_with(&format!("{}#z", expected)));
    }

    #[tokio::test]
    async fn test_issue_uses_default_holder() {
        let (service, _) = service();
        let vc = service.issue(IssueRequest::new(permit())).await.unwrap();
        assert_eq!(vc.credential.holder(), "did:example:holder");
        assert_eq!(vc.proof.verification_method, service.key_id());
        assert!(service.verify(vc.id()).await.unwrap().valid);
    }

    #[tokio::test]
    async fn test_issue_rejects_foreign_issuer() {
        let (service, _) = service();
        let mut request = IssueRequest::new(permit());
        request.issuer = Some("did:example:someone-else".into());
        let err = service.issue(request).await.unwrap_err();
        assert!(matches!(err, CredentialError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts_and_keeps_first() {
        let (service, _) = service();
        let service = service.with_id_generator(Arc::new(SameId));
        let first = service
            .issue(IssueRequest::new(permit()).with_holder("did:example:alice"))
            .await
            .unwrap();
        let second = service
            .issue(IssueRequest::new(permit()).with_holder("did:example:bob"))
            .await;
        assert!(matches!(second, Err(CredentialError::Conflict(_))));

        let stored = service.get(first.id()).await.unwrap();
        assert_eq!(stored.credential.holder(), "did:example:alice");
        assert!(service.verify(first.id()).await.unwrap().valid);
    }

    #[tokio::test]
    async fn test_generate_presentation_requires_credential() {
        let (service, _) = service();
        let err = service.generate_presentation("urn:uuid:nope").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_carries_display_fields() {
        let (service, clock) = service();
        let vc = service.issue(IssueRequest::new(permit())).await.unwrap();
        let code = service.generate_presentation(vc.id()).await.unwrap();

        let resolved = service.resolve_presentation(&code.payload).await.unwrap();
        assert!(resolved.code_fresh);
        assert!(resolved.verification.valid);
        let display = resolved.display.unwrap();
        assert_eq!(display.holder_name.as_deref(), Some("Jane Doe"));
        assert_eq!(display.permit_type.as_deref(), Some("FOOD_VENDOR"));
        assert_eq!(display.business_name.as_deref(), Some("Jane's Tacos"));
        assert_eq!(
            display.valid_until,
            Some(Utc.with_ymd_and_hms(2025, 1, 16, 0, 0, 0).unwrap())
        );
        assert!(display.claims.contains(&"permitType: FOOD_VENDOR".to_string()));

        clock.advance(chrono::Duration::hours(25));
        let stale = service.resolve_presentation(&code.payload).await.unwrap();
        assert!(!stale.code_fresh);
        assert!(stale.verification.valid);
    }

    #[tokio::test]
    async fn test_resolve_unknown_credential() {
        let (service, _) = service();
        let resolved = service.resolve_credential("urn:uuid:ghost").await.unwrap();
        assert_eq!(resolved.verification.reason, VerificationReason::UnknownCredential);
        assert!(resolved.display.is_none());
    }

    #[tokio::test]
    async fn test_retired_key_keeps_old_credentials_valid() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap(),
        ));
        let keys = Arc::new(KeyRing::new());
        let backend: Arc<dyn StoreBackend> = Arc::new(InMemoryBackend::new());
        let config = EngineConfig {
            issuer: Some("did:example:permit-office".into()),
            ..Default::default()
        };

        let old_key = KeyPair::from_seed(&[1u8; 32]);
        let old_public = old_key.public_key();
        let old = CredentialService::new(
            config.clone(),
            Arc::new(LocalKeyProvider::new(old_key)),
            Arc::new(KeyRing::new()),
            backend.clone(),
            clock.clone(),
        )
        .unwrap();
        let vc = old.issue(IssueRequest::new(permit())).await.unwrap();

        let rotated = CredentialService::new(
            config,
            Arc::new(LocalKeyProvider::new(KeyPair::from_seed(&[2u8; 32]))),
            keys,
            backend,
            clock,
        )
        .unwrap();
        assert_eq!(
            rotated.verify(vc.id()).await.unwrap().reason,
            VerificationReason::InvalidSignature
        );

        rotated.register_retired_key(old_public);
        assert!(rotated.verify(vc.id()).await.unwrap().valid);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig {
            presentation_ttl_secs: 0,
            ..Default::default()
        };
        let result = CredentialService::new(
            config,
            Arc::new(LocalKeyProvider::generate()),
            Arc::new(KeyRing::new()),
            Arc::new(InMemoryBackend::new()),
            Arc::new(attest_core::SystemClock),
        );
        assert!(result.is_err());
    }
}
