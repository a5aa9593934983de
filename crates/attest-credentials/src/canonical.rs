//! Canonical byte form of a credential, the exact input to signing.
//!
//! Top-level fields keep a fixed order. Each field value is written with
//! JCS (RFC 8785): sorted keys, compact separators, canonical numbers.

use serde_json::Value;

/// Bytes produced by canonical serialization. Only constructible here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Write `fields` as a JSON object in the given order, canonicalizing values.
    pub(crate) fn from_ordered_fields(fields: &[(&str, Value)]) -> Result<Self, serde_json::Error> {
        let mut out = String::from("{");
        for (i, (key, value)) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&serde_jcs::to_string(key)?);
            out.push(':');
            out.push_str(&serde_jcs::to_string(value)?);
        }
        out.push('}');
        Ok(Self(out.into_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
