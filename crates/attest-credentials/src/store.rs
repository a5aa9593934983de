//! Credential store: durable records keyed by credential id.
//!
//! [`StoreBackend`] is the persistence seam (in-memory here, RocksDB in the
//! node). [`CredentialStore`] wraps a backend with a request timeout so a
//! stalled backend surfaces as [`CredentialError::StoreUnavailable`] instead
//! of hanging the caller.

use async_trait::async_trait;
use attest_core::{Clock, CredentialStatus, CredentialStatusMachine, Revocation, Transition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::credential::{Credential, VerifiableCredential};
use crate::error::CredentialError;
use crate::proof::Proof;
use crate::validity::ValidityPolicy;

/// A stored credential with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub credential: Credential,
    pub proof: Proof,
    /// Stored status; expiry is derived at read time and never written.
    pub status: CredentialStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<Revocation>,
    pub stored_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(credential: Credential, proof: Proof, now: DateTime<Utc>) -> Self {
        Self {
            credential,
            proof,
            status: CredentialStatus::Active,
            revocation: None,
            stored_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.credential.id
    }

    /// Whether `revocation` is the one recorded, i.e. that call revoked it.
    pub fn revoked_by(&self, revocation: &Revocation) -> bool {
        self.revocation.as_ref() == Some(revocation)
    }

    /// The signed document as handed to holders.
    pub fn to_verifiable(&self) -> VerifiableCredential {
        VerifiableCredential::new(self.credential.clone(), self.proof.clone())
    }
}

/// Apply a revocation to a record in place. Revoking twice keeps the first
/// reason and timestamp.
pub fn apply_revocation(
    record: &mut CredentialRecord,
    revocation: Revocation,
) -> Result<bool, CredentialError> {
    match CredentialStatusMachine::revoke(record.status)? {
        Transition::Changed(status) => {
            record.status = status;
            record.updated_at = revocation.revoked_at;
            record.revocation = Some(revocation);
            Ok(true)
        }
        Transition::Unchanged(_) => Ok(false),
    }
}

/// Persistence backend for credential records.
///
/// `insert` must be atomic per id: of two concurrent inserts with the same
/// id exactly one succeeds and the other gets `Conflict`.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn insert(&self, record: CredentialRecord) -> Result<(), CredentialError>;

    async fn load(&self, id: &str) -> Result<Option<CredentialRecord>, CredentialError>;

    /// Mark a record revoked and return it. `NotFound` if the id is unknown.
    async fn revoke(
        &self,
        id: &str,
        revocation: Revocation,
    ) -> Result<CredentialRecord, CredentialError>;

    fn backend_name(&self) -> &str;
}

/// Timeout-bounded access to a [`StoreBackend`].
pub struct CredentialStore {
    backend: Arc<dyn StoreBackend>,
    validity: Arc<ValidityPolicy>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    pub fn new(
        backend: Arc<dyn StoreBackend>,
        validity: Arc<ValidityPolicy>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            validity,
            timeout,
            clock,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// Persist a freshly signed credential as `ACTIVE`.
    pub async fn put(&self, credential: Credential, proof: Proof) -> Result<(), CredentialError> {
        let id = credential.id.clone();
        let record = CredentialRecord::new(credential, proof, self.clock.now());
        self.with_timeout("put", self.backend.insert(record)).await?;
        tracing::debug!(credential_id = %id, backend = self.backend_name(), "credential stored");
        Ok(())
    }

    /// Load a record. `NotFound` if the id is unknown.
    pub async fn get(&self, id: &str) -> Result<CredentialRecord, CredentialError> {
        self.with_timeout("get", self.backend.load(id))
            .await?
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))
    }

    /// Revoke a credential. Idempotent once revoked.
    pub async fn revoke(&self, id: &str, reason: &str) -> Result<CredentialRecord, CredentialError> {
        let revocation = Revocation {
            reason: reason.to_string(),
            revoked_at: self.clock.now(),
        };
        let record = self
            .with_timeout("revoke", self.backend.revoke(id, revocation.clone()))
            .await?;
        if record.revoked_by(&revocation) {
            tracing::info!(credential_id = %id, reason = %reason, "credential revoked");
        } else {
            tracing::debug!(credential_id = %id, "credential already revoked");
        }
        Ok(record)
    }

    /// Whether the stored credential is past its validity window at `now`.
    pub async fn is_expired(&self, id: &str, now: DateTime<Utc>) -> Result<bool, CredentialError> {
        let record = self.get(id).await?;
        Ok(self.is_record_expired(&record, now))
    }

    pub fn is_record_expired(&self, record: &CredentialRecord, now: DateTime<Utc>) -> bool {
        self.validity.is_expired(&record.credential, now)
    }

    /// Status as a verifier would see it at `now`.
    pub fn effective_status(&self, record: &CredentialRecord, now: DateTime<Utc>) -> CredentialStatus {
        CredentialStatusMachine::effective(record.status, self.is_record_expired(record, now))
    }

    async fn with_timeout<T, F>(&self, op: &'static str, fut: F) -> Result<T, CredentialError>
    where
        F: Future<Output = Result<T, CredentialError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    op,
                    backend = self.backend_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "store operation timed out"
                );
                Err(CredentialError::StoreUnavailable(format!(
                    "{} timed out after {}ms",
                    op,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}
