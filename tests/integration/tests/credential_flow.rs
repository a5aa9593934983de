//! Integration test: credential lifecycle across crates.
//!
//! Issues through the service facade, then checks verification, tamper
//! detection, revocation and expiry against the shared store.

use attest_core::{Clock, CredentialStatus, VerificationReason};
use attest_credentials::{CredentialError, CredentialRecord, IssueRequest, StoreBackend};
use attest_integration_tests::{claims_of, food_vendor_permit, utc, TestEngine};
use chrono::Duration;
use serde_json::json;

// =========================================================================
// Issue → verify
// =========================================================================

#[tokio::test]
async fn test_issue_and_verify() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    assert!(vc.id().starts_with("urn:uuid:"));
    assert_eq!(vc.credential.issuer, engine.service.issuer());
    assert_eq!(vc.credential.credential_type[0], "VerifiableCredential");

    let result = engine.service.verify(vc.id()).await.unwrap();
    assert!(result.valid);
    assert_eq!(result.reason, VerificationReason::None);
    assert_eq!(result.checks.len(), 4);

    let presented = engine.service.verify_document(&vc).await.unwrap();
    assert!(presented.valid);
}

#[tokio::test]
async fn test_document_survives_json_transport() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    let wire = serde_json::to_string_pretty(&vc).unwrap();
    let received = serde_json::from_str(&wire).unwrap();
    assert!(engine.service.verify_document(&received).await.unwrap().valid);
}

// =========================================================================
// Tampering
// =========================================================================

#[tokio::test]
async fn test_tampered_presented_copy_is_rejected() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    let mut forged = vc.clone();
    forged
        .credential
        .credential_subject
        .claims
        .insert("permitType".into(), json!("LIQUOR"));

    let result = engine.service.verify_document(&forged).await.unwrap();
    assert!(!result.valid);
    assert_eq!(result.reason, VerificationReason::InvalidSignature);
}

#[tokio::test]
async fn test_subsecond_issuance_shift_is_rejected() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    let mut shifted = vc.clone();
    shifted.credential.issuance_date += Duration::milliseconds(999);

    let result = engine.service.verify_document(&shifted).await.unwrap();
    assert_eq!(result.reason, VerificationReason::InvalidSignature);
}

#[tokio::test]
async fn test_tampered_stored_record_is_rejected() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    // Same proof, different id and claims, written around the service.
    let mut credential = vc.credential.clone();
    credential.id = "urn:uuid:smuggled".into();
    credential
        .credential_subject
        .claims
        .insert("validUntil".into(), json!("2030-12-31"));
    engine
        .backend
        .insert(CredentialRecord::new(credential, vc.proof.clone(), engine.clock.now()))
        .await
        .unwrap();

    let result = engine.service.verify("urn:uuid:smuggled").await.unwrap();
    assert_eq!(result.reason, VerificationReason::InvalidSignature);
}

// =========================================================================
// Revocation
// =========================================================================

#[tokio::test]
async fn test_revoke_is_idempotent_and_final() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    let first = engine.service.revoke(vc.id(), "health code violation").await.unwrap();
    engine.clock.advance(Duration::minutes(5));
    let second = engine.service.revoke(vc.id(), "again").await.unwrap();

    assert_eq!(first.status, CredentialStatus::Revoked);
    assert_eq!(second.revocation, first.revocation);

    let result = engine.service.verify(vc.id()).await.unwrap();
    assert_eq!(result.reason, VerificationReason::Revoked);
}

#[tokio::test]
async fn test_revoke_unknown_is_not_found() {
    let engine = TestEngine::new();
    let err = engine.service.revoke("urn:uuid:ghost", "x").await.unwrap_err();
    assert!(matches!(err, CredentialError::NotFound(_)));
}

// =========================================================================
// Expiry
// =========================================================================

#[tokio::test]
async fn test_expiry_tracks_clock_both_ways() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    engine.clock.set(utc(2025, 1, 15, 23, 59, 59));
    assert!(engine.service.verify(vc.id()).await.unwrap().valid);

    engine.clock.set(utc(2025, 1, 16, 0, 0, 0));
    let expired = engine.service.verify(vc.id()).await.unwrap();
    assert_eq!(expired.reason, VerificationReason::Expired);

    // Expiry is never stored: rolling the clock back restores validity.
    engine.clock.set(utc(2025, 1, 10, 12, 0, 0));
    assert!(engine.service.verify(vc.id()).await.unwrap().valid);
    let record = engine.service.get(vc.id()).await.unwrap();
    assert_eq!(record.status, CredentialStatus::Active);
}

#[tokio::test]
async fn test_credential_without_validity_claim_never_expires() {
    let engine = TestEngine::new();
    let vc = engine
        .issue(json!({"permitType": "STREET_MUSICIAN"}), "did:example:sam")
        .await;
    engine.clock.set(utc(2099, 1, 1, 0, 0, 0));
    assert!(engine.service.verify(vc.id()).await.unwrap().valid);
}

// =========================================================================
// Issuance rejections
// =========================================================================

#[tokio::test]
async fn test_invalid_issuance_persists_nothing() {
    let engine = TestEngine::new();

    for claims in [
        json!({}),
        json!({"issuer": "did:example:me", "permitType": "FOOD_VENDOR"}),
        json!({"permitType": "FOOD_VENDOR", "validUntil": "whenever"}),
    ] {
        let err = engine
            .service
            .issue(IssueRequest::new(claims_of(claims)))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::Validation(_)));
    }
    assert!(engine.backend.is_empty());
}
