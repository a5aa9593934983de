//! Presentation channel: QR codes that point a verifier back at the
//! verification endpoint for one credential.
//!
//! The code only carries a reference (`{base}/{id}?iat=..&exp=..`). Scanning
//! it always re-runs verification, so a revocation issued after the code was
//! printed still takes effect.

use attest_core::Clock;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use percent_encoding::percent_decode_str;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use url::Url;

use crate::error::CredentialError;

/// Pointer to a credential, valid for re-verification until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationReference {
    pub credential_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PresentationReference {
    /// Build a reference from unix-second bounds as carried in the URL.
    pub fn from_unix(
        credential_id: impl Into<String>,
        iat: i64,
        exp: i64,
    ) -> Result<Self, CredentialError> {
        let issued_at = DateTime::from_timestamp(iat, 0)
            .ok_or_else(|| CredentialError::Validation(format!("iat out of range: {}", iat)))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| CredentialError::Validation(format!("exp out of range: {}", exp)))?;
        if expires_at <= issued_at {
            return Err(CredentialError::Validation(
                "presentation reference expires before it was issued".into(),
            ));
        }
        Ok(Self {
            credential_id: credential_id.into(),
            issued_at,
            expires_at,
        })
    }

    /// Whether the code itself is still fresh. Says nothing about the credential.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A rendered presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualCode {
    /// Text encoded in the QR code (the verification URL).
    pub payload: String,
    /// PNG rendering as a `data:image/png;base64,` URL.
    pub image: String,
    pub reference: PresentationReference,
}

pub struct PresentationChannel {
    base_url: Url,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PresentationChannel {
    pub fn new(base_url: &str, ttl_secs: i64, clock: Arc<dyn Clock>) -> Result<Self, CredentialError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CredentialError::Validation(format!("invalid verify base url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CredentialError::Validation(format!(
                "verify base url cannot carry a path: {}",
                base_url
            )));
        }
        let ttl = Duration::try_seconds(ttl_secs)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                CredentialError::Validation(format!(
                    "presentation ttl must be a positive number of seconds, got {}",
                    ttl_secs
                ))
            })?;
        Ok(Self {
            base_url,
            ttl,
            clock,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the reference and the QR code for a credential id.
    pub fn encode(&self, credential_id: &str) -> Result<VisualCode, CredentialError> {
        if credential_id.trim().is_empty() {
            return Err(CredentialError::Validation("credential id must not be empty".into()));
        }

        let issued_at = self.clock.now().trunc_subsecs(0);
        let expires_at = issued_at.checked_add_signed(self.ttl).ok_or_else(|| {
            CredentialError::Validation(format!(
                "presentation ttl of {}s overflows the code expiry",
                self.ttl.num_seconds()
            ))
        })?;
        let reference = PresentationReference {
            credential_id: credential_id.to_string(),
            issued_at,
            expires_at,
        };

        let payload = self.reference_url(&reference)?.to_string();
        let image = render_qr_png(&payload)?;

        tracing::debug!(
            credential_id = %credential_id,
            expires_at = %reference.expires_at,
            "presentation code generated"
        );

        Ok(VisualCode {
            payload,
            image,
            reference,
        })
    }

    /// Parse a scanned payload back into a reference. Freshness is not checked.
    pub fn decode(&self, payload: &str) -> Result<PresentationReference, CredentialError> {
        let invalid = |why: &str| CredentialError::Validation(format!("presentation payload {}", why));

        let url = Url::parse(payload.trim()).map_err(|_| invalid("is not a URL"))?;
        if url.origin() != self.base_url.origin() {
            return Err(invalid("points at a foreign origin"));
        }

        let base: Vec<&str> = self.base_segments().collect();
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() != base.len() + 1 || segments[..base.len()] != base[..] {
            return Err(invalid("is not under the verification path"));
        }
        let credential_id = percent_decode_str(segments[base.len()])
            .decode_utf8()
            .map_err(|_| invalid("has a malformed credential id"))?
            .into_owned();

        let mut iat = None;
        let mut exp = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "iat" => iat = value.parse::<i64>().ok(),
                "exp" => exp = value.parse::<i64>().ok(),
                _ => {}
            }
        }
        let iat = iat.ok_or_else(|| invalid("has a missing or malformed iat"))?;
        let exp = exp.ok_or_else(|| invalid("has a missing or malformed exp"))?;
        PresentationReference::from_unix(credential_id, iat, exp)
    }

    fn base_segments(&self) -> impl Iterator<Item = &str> {
        self.base_url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|seg| !seg.is_empty())
    }

    fn reference_url(&self, reference: &PresentationReference) -> Result<Url, CredentialError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| CredentialError::Validation("verify base url cannot carry a path".into()))?
            .pop_if_empty()
            .push(&reference.credential_id);
        url.query_pairs_mut()
            .append_pair("iat", &reference.issued_at.timestamp().to_string())
            .append_pair("exp", &reference.expires_at.timestamp().to_string());
        Ok(url)
    }
}

/// Render `data` as a QR code PNG in a base64 data URL.
pub fn render_qr_png(data: &str) -> Result<String, CredentialError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| CredentialError::Validation(format!("cannot encode QR code: {}", e)))?;

    let img = code.render::<image::Luma<u8>>().build();
    let mut buffer: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| CredentialError::Validation(format!("cannot render QR code: {}", e)))?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&buffer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::ManualClock;
    use chrono::TimeZone;

    fn channel(base: &str) -> (PresentationChannel, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap(),
        ));
        (PresentationChannel::new(base, 86_400, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn test_encode_builds_verification_url() {
        let (ch, clock) = channel("http://localhost:9001/vc/verify");
        let code = ch.encode("urn:uuid:0190").unwrap();

        let iat = clock.now().timestamp();
        assert_eq!(
            code.payload,
            format!(
                "http://localhost:9001/vc/verify/urn:uuid:0190?iat={}&exp={}",
                iat,
                iat + 86_400
            )
        );
        assert!(code.image.starts_with("data:image/png;base64,"));
        assert_eq!(code.reference.expires_at - code.reference.issued_at, Duration::hours(24));
    }

    #[test]
    fn test_decode_roundtrips_reference() {
        let (ch, _) = channel("https://permits.example.gov/vc/verify/");
        let code = ch.encode("permit 42/a").unwrap();
        let reference = ch.decode(&code.payload).unwrap();
        assert_eq!(reference, code.reference);
        assert_eq!(reference.credential_id, "permit 42/a");
    }

    #[test]
    fn test_freshness_is_about_the_code() {
        let (ch, clock) = channel("http://localhost:9001/vc/verify");
        let reference = ch.encode("vc-1").unwrap().reference;
        assert!(reference.is_fresh(clock.now()));
        clock.advance(Duration::hours(24));
        assert!(!reference.is_fresh(clock.now()));
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        let (ch, _) = channel("http://localhost:9001/vc/verify");
        for payload in [
            "vc-1",
            "http://evil.example/vc/verify/vc-1?iat=1&exp=2",
            "http://localhost:9001/other/vc-1?iat=1&exp=2",
            "http://localhost:9001/vc/verify?iat=1&exp=2",
            "http://localhost:9001/vc/verify/vc-1/extra?iat=1&exp=2",
            "http://localhost:9001/vc/verify/vc-1?exp=2",
            "http://localhost:9001/vc/verify/vc-1?iat=abc&exp=2",
            "http://localhost:9001/vc/verify/vc-1?iat=5&exp=5",
        ] {
            assert!(
                matches!(ch.decode(payload), Err(CredentialError::Validation(_))),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        assert!(PresentationChannel::new("not a url", 60, clock.clone()).is_err());
        assert!(PresentationChannel::new("mailto:ops@example.gov", 60, clock.clone()).is_err());
        assert!(PresentationChannel::new("http://localhost/vc/verify", 0, clock.clone()).is_err());
        assert!(matches!(
            PresentationChannel::new("http://localhost/vc/verify", i64::MAX / 2, clock),
            Err(CredentialError::Validation(_))
        ));
    }

    #[test]
    fn test_encode_reports_expiry_overflow() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ch = PresentationChannel::new("http://localhost/vc/verify", 9_000_000_000_000, clock)
            .unwrap();
        assert!(matches!(ch.encode("vc-1"), Err(CredentialError::Validation(_))));
    }

    #[test]
    fn test_render_qr_png() {
        let image = render_qr_png("http://localhost:9001/vc/verify/vc-1").unwrap();
        let encoded = image.trim_start_matches("data:image/png;base64,");
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
