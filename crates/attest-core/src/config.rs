use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CoreError;

/// Longest a presentation code may stay fresh: one year.
pub const MAX_PRESENTATION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Configuration for the credential engine. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Issuer identity written into every credential. When unset, the
    /// `did:key` of the signing key is used.
    pub issuer: Option<String>,
    /// JSON-LD contexts, in document order.
    pub contexts: Vec<String>,
    /// Type tags added after the base type when a request names none.
    pub default_types: Vec<String>,
    /// Holder identity used when an issue request omits one.
    pub default_holder: String,
    /// Base URL that presentation codes point at.
    pub verify_base_url: String,
    /// How long a generated presentation code stays fresh, in seconds.
    pub presentation_ttl_secs: i64,
    /// Request-level timeout for every store operation, in milliseconds.
    /// Set by the embedding application (the node's `[storage] timeout_ms`),
    /// never read from a config document.
    #[serde(skip)]
    pub store_timeout_ms: u64,
    /// Claim keys searched for a validity end date, in order.
    pub validity_claims: Vec<String>,
    /// Per-type override: type tag → claim key holding the validity end.
    pub type_validity_claims: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            issuer: None,
            contexts: vec![
                "https://www.w3.org/2018/credentials/v1".into(),
                "https://digit.org/credentials/permit/v1".into(),
            ],
            default_types: vec!["PermitCredential".into()],
            default_holder: "did:example:holder".into(),
            verify_base_url: "http://localhost:9001/vc/verify".into(),
            presentation_ttl_secs: 24 * 60 * 60,
            store_timeout_ms: 2_000,
            validity_claims: vec![
                "validUntil".into(),
                "expiryDate".into(),
                "expirationDate".into(),
                "validTo".into(),
            ],
            type_validity_claims: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.contexts.is_empty() {
            return Err(CoreError::InvalidConfig(
                "at least one @context is required".into(),
            ));
        }
        if self.presentation_ttl_secs <= 0 || self.presentation_ttl_secs > MAX_PRESENTATION_TTL_SECS {
            return Err(CoreError::InvalidConfig(format!(
                "presentation_ttl_secs must be in 1..={}, got {}",
                MAX_PRESENTATION_TTL_SECS, self.presentation_ttl_secs
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "store_timeout_ms must be positive".into(),
            ));
        }
        if !self.verify_base_url.starts_with("http://")
            && !self.verify_base_url.starts_with("https://")
        {
            return Err(CoreError::InvalidConfig(format!(
                "verify_base_url must be an http(s) URL, got {}",
                self.verify_base_url
            )));
        }
        if matches!(self.issuer.as_deref(), Some(i) if i.trim().is_empty()) {
            return Err(CoreError::InvalidConfig("issuer must not be blank".into()));
        }
        Ok(())
    }
}
