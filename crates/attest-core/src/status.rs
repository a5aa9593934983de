use std::fmt;

use crate::error::CoreError;

/// Lifecycle status of an issued credential.
///
/// Only `Active` and `Revoked` are ever persisted. `Expired` is derived at
/// query time from the credential's validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialStatus {
    /// Credential is signed, stored and usable.
    Active,
    /// Credential has been permanently revoked by the issuer. Final state.
    Revoked,
    /// The credential's validity window has elapsed. Never stored.
    Expired,
}

impl CredentialStatus {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Revoked | Self::Expired)
    }

    /// Whether a store may persist this status.
    pub fn is_storable(&self) -> bool {
        !matches!(self, Self::Expired)
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Revoked => write!(f, "REVOKED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Outcome of applying a revocation to a stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status changed and must be written back.
    Changed(CredentialStatus),
    /// The status already matched; nothing to write.
    Unchanged(CredentialStatus),
}

impl Transition {
    /// The resulting status, regardless of whether it changed.
    pub fn status(&self) -> CredentialStatus {
        match self {
            Self::Changed(s) | Self::Unchanged(s) => *s,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Stored status transitions.
///
/// Valid transitions:
/// - Active → Revoked
/// - Revoked → Revoked (idempotent, no write)
///
/// Expiry is never a stored transition; see [`CredentialStatusMachine::effective`].
pub struct CredentialStatusMachine;

impl CredentialStatusMachine {
    /// Apply a revocation to the stored status.
    pub fn revoke(current: CredentialStatus) -> Result<Transition, CoreError> {
        let transition = match current {
            CredentialStatus::Active => Transition::Changed(CredentialStatus::Revoked),
            CredentialStatus::Revoked => Transition::Unchanged(CredentialStatus::Revoked),
            CredentialStatus::Expired => {
                return Err(CoreError::InvalidStatusTransition {
                    from: current,
                    to: CredentialStatus::Revoked,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %transition.status(),
            changed = transition.is_changed(),
            "credential status transition"
        );

        Ok(transition)
    }

    /// Check if a revocation is valid without performing it.
    pub fn can_revoke(current: CredentialStatus) -> bool {
        Self::revoke(current).is_ok()
    }

    /// Status as observed by a verifier: revocation wins over expiry,
    /// expiry is computed against the caller's clock.
    pub fn effective(stored: CredentialStatus, expired: bool) -> CredentialStatus {
        match stored {
            CredentialStatus::Revoked => CredentialStatus::Revoked,
            _ if expired => CredentialStatus::Expired,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_from_active() {
        let t = CredentialStatusMachine::revoke(CredentialStatus::Active).unwrap();
        assert_eq!(t, Transition::Changed(CredentialStatus::Revoked));
        assert!(t.status().is_final());
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let t = CredentialStatusMachine::revoke(CredentialStatus::Revoked).unwrap();
        assert_eq!(t, Transition::Unchanged(CredentialStatus::Revoked));
        assert!(!t.is_changed());
    }

    #[test]
    fn test_expired_is_not_a_stored_state() {
        assert!(CredentialStatusMachine::revoke(CredentialStatus::Expired).is_err());
        assert!(!CredentialStatus::Expired.is_storable());
        assert!(CredentialStatus::Active.is_storable());
        assert!(CredentialStatus::Revoked.is_storable());
    }

    #[test]
    fn test_can_revoke() {
        assert!(CredentialStatusMachine::can_revoke(CredentialStatus::Active));
        assert!(CredentialStatusMachine::can_revoke(CredentialStatus::Revoked));
        assert!(!CredentialStatusMachine::can_revoke(CredentialStatus::Expired));
    }

    #[test]
    fn test_effective_status() {
        use CredentialStatus::*;
        assert_eq!(CredentialStatusMachine::effective(Active, false), Active);
        assert_eq!(CredentialStatusMachine::effective(Active, true), Expired);
        assert_eq!(CredentialStatusMachine::effective(Revoked, true), Revoked);
        assert_eq!(CredentialStatusMachine::effective(Revoked, false), Revoked);
    }

    #[test]
    fn test_final_states() {
        assert!(CredentialStatus::Revoked.is_final());
        assert!(CredentialStatus::Expired.is_final());
        assert!(!CredentialStatus::Active.is_final());
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(format!("{}", CredentialStatus::Active), "ACTIVE");
        assert_eq!(
            serde_json::to_string(&CredentialStatus::Revoked).unwrap(),
            "\"REVOKED\""
        );
        let back: CredentialStatus = serde_json::from_str("\"EXPIRED\"").unwrap();
        assert_eq!(back, CredentialStatus::Expired);
    }
}
