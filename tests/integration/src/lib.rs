//! Shared fixtures for the cross-crate credential flows.

use std::sync::Arc;

use attest_core::{EngineConfig, ManualClock, SubjectClaims};
use attest_credentials::{
    CredentialService, InMemoryBackend, IssueRequest, StoreBackend, VerifiableCredential,
};
use attest_crypto::{KeyPair, KeyRing, LocalKeyProvider};
use chrono::{DateTime, TimeZone, Utc};

/// A credential service on an in-memory store with a hand-driven clock.
pub struct TestEngine {
    pub service: CredentialService,
    pub clock: Arc<ManualClock>,
    pub backend: Arc<InMemoryBackend>,
}

impl TestEngine {
    /// Engine with default config, clock at 2024-12-01T09:00:00Z.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::new(utc(2024, 12, 1, 9, 0, 0)));
        let backend = Arc::new(InMemoryBackend::new());
        let store: Arc<dyn StoreBackend> = backend.clone();
        let service = CredentialService::new(
            config,
            Arc::new(LocalKeyProvider::new(KeyPair::from_seed(&[42u8; 32]))),
            Arc::new(KeyRing::new()),
            store,
            clock.clone(),
        )
        .expect("engine config is valid");
        Self {
            service,
            clock,
            backend,
        }
    }

    /// Issue a permit with the given claims to `holder`.
    pub async fn issue(&self, claims: serde_json::Value, holder: &str) -> VerifiableCredential {
        self.service
            .issue(IssueRequest::new(claims_of(claims)).with_holder(holder))
            .await
            .expect("issuance should succeed")
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// The FOOD_VENDOR permit used across the flows.
pub fn food_vendor_permit() -> serde_json::Value {
    serde_json::json!({
        "permitType": "FOOD_VENDOR",
        "applicant": "Jane Doe",
        "businessName": "Jane's Tacos",
        "validUntil": "2025-01-15"
    })
}

pub fn claims_of(value: serde_json::Value) -> SubjectClaims {
    value.as_object().cloned().unwrap_or_default()
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .expect("valid test timestamp")
}
