//! Validity window of a permit credential, derived from its claims.
//!
//! The end date lives in a subject claim (`validUntil` and friends). A
//! date-only value keeps the credential valid through the end of that UTC
//! day; a full RFC 3339 timestamp is an exact instant.

use attest_core::EngineConfig;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::credential::Credential;
use crate::error::CredentialError;

/// Which claim carries the validity end, globally and per credential type.
#[derive(Debug, Clone)]
pub struct ValidityPolicy {
    claim_keys: Vec<String>,
    type_overrides: BTreeMap<String, String>,
}

impl Default for ValidityPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ValidityPolicy {
    pub fn new(claim_keys: Vec<String>, type_overrides: BTreeMap<String, String>) -> Self {
        Self {
            claim_keys,
            type_overrides,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.validity_claims.clone(),
            config.type_validity_claims.clone(),
        )
    }

    /// Claim key and raw value holding the validity end, if any.
    fn locate<'a>(&self, credential: &'a Credential) -> Option<(&str, &'a Value)> {
        let claims = credential.claims();

        for tag in credential.specific_types() {
            if let Some(key) = self.type_overrides.get(tag) {
                if let Some(value) = claims.get(key) {
                    return Some((key.as_str(), value));
                }
            }
        }

        self.claim_keys
            .iter()
            .find_map(|key| claims.get(key).map(|v| (key.as_str(), v)))
    }

    /// Exclusive upper bound of the validity window. `Ok(None)` means the
    /// credential never expires.
    pub fn expires_at(
        &self,
        credential: &Credential,
    ) -> Result<Option<DateTime<Utc>>, CredentialError> {
        let Some((key, value)) = self.locate(credential) else {
            return Ok(None);
        };

        let raw = value.as_str().ok_or_else(|| {
            CredentialError::Validation(format!("claim '{}' must be a date string", key))
        })?;

        parse_validity_end(raw)
            .map(Some)
            .ok_or_else(|| {
                CredentialError::Validation(format!(
                    "claim '{}' is not a date or RFC 3339 timestamp: {}",
                    key, raw
                ))
            })
    }

    /// Whether the credential is past its validity window at `now`.
    /// An unreadable end date counts as expired.
    pub fn is_expired(&self, credential: &Credential, now: DateTime<Utc>) -> bool {
        match self.expires_at(credential) {
            Ok(Some(bound)) => now >= bound,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(
                    credential_id = %credential.id,
                    error = %e,
                    "unreadable validity claim, treating credential as expired"
                );
                true
            }
        }
    }
}

fn parse_validity_end(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let next = day.checked_add_days(Days::new(1))?;
    Some(next.and_hms_opt(0, 0, 0)?.and_utc())
}
