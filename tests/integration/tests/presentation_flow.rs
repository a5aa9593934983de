//! Integration test: QR presentation codes and scan resolution.

use attest_core::VerificationReason;
use attest_integration_tests::{food_vendor_permit, utc, TestEngine};
use chrono::Duration;

#[tokio::test]
async fn test_code_roundtrip_resolves_same_credential() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;

    let code = engine.service.generate_presentation(vc.id()).await.unwrap();
    assert!(code.payload.starts_with("http://localhost:9001/vc/verify/"));
    assert!(code.image.starts_with("data:image/png;base64,"));
    assert_eq!(
        code.reference.expires_at - code.reference.issued_at,
        Duration::hours(24)
    );

    let resolved = engine
        .service
        .resolve_presentation(&code.payload)
        .await
        .unwrap();
    assert_eq!(resolved.credential_id, vc.id());
    assert_eq!(resolved.reference.as_ref(), Some(&code.reference));
    assert!(resolved.verification.valid);

    let display = resolved.display.unwrap();
    assert_eq!(display.holder, "did:example:jane");
    assert_eq!(display.holder_name.as_deref(), Some("Jane Doe"));
    assert_eq!(display.permit_type.as_deref(), Some("FOOD_VENDOR"));
}

#[tokio::test]
async fn test_revocation_after_code_generation_is_honoured() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;
    let code = engine.service.generate_presentation(vc.id()).await.unwrap();

    engine.service.revoke(vc.id(), "permit suspended").await.unwrap();

    let resolved = engine
        .service
        .resolve_presentation(&code.payload)
        .await
        .unwrap();
    assert!(resolved.code_fresh);
    assert!(!resolved.verification.valid);
    assert_eq!(resolved.verification.reason, VerificationReason::Revoked);
}

#[tokio::test]
async fn test_stale_code_still_reports_credential_state() {
    let engine = TestEngine::new();
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;
    let code = engine.service.generate_presentation(vc.id()).await.unwrap();

    engine.clock.set(utc(2024, 12, 3, 9, 0, 0));
    let resolved = engine
        .service
        .resolve_presentation(&code.payload)
        .await
        .unwrap();
    assert!(!resolved.code_fresh);
    assert!(resolved.verification.valid);
}

#[tokio::test]
async fn test_foreign_payload_is_rejected() {
    let engine = TestEngine::new();
    let result = engine
        .service
        .resolve_presentation("https://evil.example/vc/verify/x?iat=1&exp=2")
        .await;
    assert!(result.is_err());
}
