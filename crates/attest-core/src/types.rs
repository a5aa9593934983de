use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Permit claims carried in a credential subject. Keys are unique by
/// construction; `serde_json::Map` keeps them ordered.
pub type SubjectClaims = serde_json::Map<String, serde_json::Value>;

/// Type tag present on every credential, always in first position.
pub const BASE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Claim keys that would collide with document-level fields.
pub const RESERVED_CLAIM_KEYS: [&str; 4] = ["id", "proof", "issuer", "issuanceDate"];

/// Why a verification came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationReason {
    /// Every check passed.
    None,
    /// No credential with that id exists in the store.
    UnknownCredential,
    /// The issuer revoked the credential.
    Revoked,
    /// The credential's validity window has elapsed.
    Expired,
    /// The proof does not verify over the canonical document bytes.
    InvalidSignature,
}

impl fmt::Display for VerificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::UnknownCredential => write!(f, "UNKNOWN_CREDENTIAL"),
            Self::Revoked => write!(f, "REVOKED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::InvalidSignature => write!(f, "INVALID_SIGNATURE"),
        }
    }
}

/// A single check performed during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCheck {
    /// Name of the check (`exists`, `not_revoked`, `not_expired`, `signature_valid`).
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Optional detail message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationCheck {
    pub fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: None,
        }
    }

    pub fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Outcome of verifying a credential. Invalidity is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether the credential is valid right now.
    pub valid: bool,
    /// Reason code; `None` exactly when `valid` is true.
    pub reason: VerificationReason,
    /// Credential the verification ran against.
    pub credential_id: String,
    /// When the verification ran.
    pub verified_at: DateTime<Utc>,
    /// Checks in the order they ran; stops at the first failure.
    pub checks: Vec<VerificationCheck>,
}

impl VerificationResult {
    /// Build a result from the checks that ran.
    pub fn from_checks(
        credential_id: impl Into<String>,
        reason: VerificationReason,
        verified_at: DateTime<Utc>,
        checks: Vec<VerificationCheck>,
    ) -> Self {
        Self {
            valid: reason == VerificationReason::None,
            reason,
            credential_id: credential_id.into(),
            verified_at,
            checks,
        }
    }
}

/// Revocation details recorded alongside a revoked credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revocation {
    /// Free-text reason supplied by the issuer.
    pub reason: String,
    /// When the credential was first revoked.
    pub revoked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_wire_format() {
        let json = serde_json::to_string(&VerificationReason::UnknownCredential).unwrap();
        assert_eq!(json, "\"UNKNOWN_CREDENTIAL\"");
        let back: VerificationReason = serde_json::from_str("\"INVALID_SIGNATURE\"").unwrap();
        assert_eq!(back, VerificationReason::InvalidSignature);
        assert_eq!(format!("{}", VerificationReason::None), "NONE");
    }

    #[test]
    fn test_result_valid_iff_reason_none() {
        let now = Utc::now();
        let ok = VerificationResult::from_checks("vc-1", VerificationReason::None, now, vec![]);
        assert!(ok.valid);
        let bad =
            VerificationResult::from_checks("vc-1", VerificationReason::Revoked, now, vec![]);
        assert!(!bad.valid);
    }

    #[test]
    fn test_check_constructors() {
        let c = VerificationCheck::pass("exists");
        assert!(c.passed);
        assert!(c.detail.is_none());

        let c = VerificationCheck::fail("not_revoked", "revoked: fraud");
        assert!(!c.passed);
        assert_eq!(c.detail.as_deref(), Some("revoked: fraud"));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let r = VerificationResult::from_checks(
            "vc-9",
            VerificationReason::Expired,
            Utc::now(),
            vec![VerificationCheck::pass("exists")],
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["credentialId"], "vc-9");
        assert_eq!(v["reason"], "EXPIRED");
        assert_eq!(v["valid"], false);
        assert!(v.get("verifiedAt").is_some());
    }

    #[test]
    fn test_reserved_keys() {
        assert!(RESERVED_CLAIM_KEYS.contains(&"issuanceDate"));
        assert!(!RESERVED_CLAIM_KEYS.contains(&"permitType"));
    }
}
