use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::hashing::hash;

/// Multicodec prefix for an Ed25519 public key (`ed25519-pub`, varint 0xed).
const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Ed25519 key pair held by a signing authority.
/// Private key material is zeroized on drop by ed25519-dalek.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create a key pair from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        Ok(kp)
    }

    /// Decode a key pair from a 64-character hex seed.
    pub fn from_hex_seed(hex_str: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(hex_str.trim())
            .map_err(|e| CryptoError::KeyLoadError(format!("invalid hex seed: {}", e)))?;
        let kp = Self::from_bytes(&bytes);
        bytes.zeroize();
        kp
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Get the raw private key bytes (32 bytes).
    /// Use with caution — prefer the signing functions.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

/// Ed25519 public key for verification operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Create from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        let verifying_key = VerifyingKey::from_bytes(&bytes_arr)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    /// Get the raw bytes (32 bytes).
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Decode from hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// `did:key` identifier for this key (multicodec + base58btc).
    pub fn to_did_key(&self) -> String {
        let mut buf = Vec::with_capacity(34);
        buf.extend_from_slice(&ED25519_MULTICODEC);
        buf.extend_from_slice(self.as_bytes());
        format!("did:key:z{}", bs58::encode(buf).into_string())
    }

    /// Parse a `did:key` identifier produced by [`PublicKey::to_did_key`].
    pub fn from_did_key(did: &str) -> Result<Self, CryptoError> {
        let encoded = did
            .trim()
            .strip_prefix("did:key:z")
            .ok_or_else(|| CryptoError::InvalidInput(format!("not a base58 did:key: {}", did)))?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::InvalidInput(format!("invalid base58: {}", e)))?;
        match bytes.strip_prefix(&ED25519_MULTICODEC[..]) {
            Some(key) => Self::from_bytes(key),
            None => Err(CryptoError::InvalidInput(
                "did:key is not an ed25519 key".into(),
            )),
        }
    }

    /// Short, stable fingerprint: base58 of the first 16 bytes of BLAKE3(key).
    pub fn fingerprint(&self) -> String {
        let digest = hash(self.as_bytes());
        format!("z{}", bs58::encode(&digest[..16]).into_string())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

/// Verification key id referenced from proofs: `<issuer>#<fingerprint>`.
///
/// The id names the key; it never carries key material that a verifier
/// would trust on its own.
pub fn key_id_for(issuer: &str, key: &PublicKey) -> String {
    format!("{}#{}", issuer, key.fingerprint())
}
