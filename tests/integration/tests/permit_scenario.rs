//! Integration test: a FOOD_VENDOR permit from approval to expiry.

use attest_core::VerificationReason;
use attest_integration_tests::{food_vendor_permit, utc, TestEngine};

#[tokio::test]
async fn test_food_vendor_permit_lifecycle() {
    let engine = TestEngine::new();
    engine.clock.set(utc(2024, 12, 1, 9, 0, 0));

    // Approved permit comes in from the workflow and is issued.
    let vc = engine.issue(food_vendor_permit(), "did:example:jane").await;
    assert_eq!(vc.credential.claims()["validUntil"], "2025-01-15");

    // Inspector scans the code during the permit window.
    let code = engine.service.generate_presentation(vc.id()).await.unwrap();
    let scan = engine
        .service
        .resolve_presentation(&code.payload)
        .await
        .unwrap();
    assert!(scan.verification.valid);
    assert_eq!(
        scan.display.as_ref().and_then(|d| d.valid_until),
        Some(utc(2025, 1, 16, 0, 0, 0))
    );

    // After the window closes the same credential reports EXPIRED.
    engine.clock.set(utc(2025, 2, 1, 8, 0, 0));
    let late = engine.service.verify(vc.id()).await.unwrap();
    assert!(!late.valid);
    assert_eq!(late.reason, VerificationReason::Expired);

    // Clock correction back into the window: valid again.
    engine.clock.set(utc(2025, 1, 14, 8, 0, 0));
    assert!(engine.service.verify(vc.id()).await.unwrap().valid);

    // Revocation wins over everything after that.
    engine.service.revoke(vc.id(), "vendor closed").await.unwrap();
    engine.clock.set(utc(2025, 2, 1, 8, 0, 0));
    let revoked = engine.service.verify(vc.id()).await.unwrap();
    assert_eq!(revoked.reason, VerificationReason::Revoked);
}
