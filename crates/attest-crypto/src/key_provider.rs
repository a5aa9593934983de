//! Key provider seams.
//!
//! Signing goes through [`SigningKeyProvider`] so the issuing key can live
//! in memory, in the environment, or in a seed file without the proof engine
//! knowing which. Verification looks keys up by id through
//! [`VerificationKeyResolver`]; [`KeyRing`] keeps retired keys so documents
//! signed before a rotation still verify.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};
use crate::signing::{sign, Signature};

/// Source of the issuer's signing key.
///
/// Implementations must be `Send + Sync`; one provider is shared by every
/// request handler.
pub trait SigningKeyProvider: Send + Sync {
    /// Sign canonical document bytes with the managed key.
    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError>;

    /// Public half of the managed key.
    fn public_key(&self) -> Result<PublicKey, CryptoError>;

    /// Human-readable name for diagnostics.
    fn provider_name(&self) -> &str;
}

/// Looks up verification keys by their id.
pub trait VerificationKeyResolver: Send + Sync {
    /// `Ok(None)` means the id is unknown; `Err` means the lookup itself failed.
    fn resolve(&self, key_id: &str) -> Result<Option<PublicKey>, CryptoError>;
}

// ─── LocalKeyProvider ────────────────────────────────────────────────────

/// In-memory key provider for development and tests.
pub struct LocalKeyProvider {
    keypair: KeyPair,
}

impl LocalKeyProvider {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// Generate a fresh ephemeral key.
    pub fn generate() -> Self {
        Self::new(KeyPair::generate())
    }
}

impl SigningKeyProvider for LocalKeyProvider {
    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        Ok(sign(message, &self.keypair))
    }

    fn public_key(&self) -> Result<PublicKey, CryptoError> {
        Ok(self.keypair.public_key())
    }

    fn provider_name(&self) -> &str {
        "local"
    }
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads the signing key from an environment variable holding a
/// 64-character hex seed. Read once at construction.
pub struct EnvKeyProvider {
    keypair: KeyPair,
    var_name: String,
}

impl EnvKeyProvider {
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let mut value = std::env::var(var_name).map_err(|_| {
            CryptoError::KeyLoadError(format!("environment variable {} not set", var_name))
        })?;
        let keypair = KeyPair::from_hex_seed(&value);
        value.zeroize();
        Ok(Self {
            keypair: keypair?,
            var_name: var_name.to_string(),
        })
    }

    /// Name of the variable the key was read from.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl SigningKeyProvider for EnvKeyProvider {
    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        Ok(sign(message, &self.keypair))
    }

    fn public_key(&self) -> Result<PublicKey, CryptoError> {
        Ok(self.keypair.public_key())
    }

    fn provider_name(&self) -> &str {
        "env"
    }
}

// ─── FileKeyProvider ─────────────────────────────────────────────────────

/// Keeps the signing seed (hex) in a file, generating one on first start.
pub struct FileKeyProvider {
    keypair: KeyPair,
    path: PathBuf,
}

impl FileKeyProvider {
    pub fn load_or_generate(path: &Path) -> Result<Self, CryptoError> {
        let io_err = |e: std::io::Error| CryptoError::KeyLoadError(format!("{}: {}", path.display(), e));

        let keypair = if path.exists() {
            let mut contents = std::fs::read_to_string(path).map_err(io_err)?;
            let keypair = KeyPair::from_hex_seed(&contents);
            contents.zeroize();
            tracing::info!(path = %path.display(), "loaded signing key from disk");
            keypair?
        } else {
            let keypair = KeyPair::generate();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
            let mut seed_hex = hex::encode(keypair.secret_bytes());
            let written = write_secret(path, seed_hex.as_bytes());
            seed_hex.zeroize();
            written.map_err(io_err)?;
            tracing::info!(path = %path.display(), "generated and saved new signing key");
            keypair
        };

        Ok(Self {
            keypair,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create `path` readable by the owner only, then write `contents`.
fn write_secret(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl SigningKeyProvider for FileKeyProvider {
    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        Ok(sign(message, &self.keypair))
    }

    fn public_key(&self) -> Result<PublicKey, CryptoError> {
        Ok(self.keypair.public_key())
    }

    fn provider_name(&self) -> &str {
        "file"
    }
}

// ─── KeyRing ─────────────────────────────────────────────────────────────

/// In-process registry of trusted verification keys, current and retired.
#[derive(Default)]
pub struct KeyRing {
    keys: DashMap<String, PublicKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under its id. Re-registering the same id replaces it.
    pub fn insert(&self, key_id: impl Into<String>, key: PublicKey) {
        let key_id = key_id.into();
        tracing::debug!(key_id = %key_id, "verification key registered");
        self.keys.insert(key_id, key);
    }

    pub fn remove(&self, key_id: &str) -> bool {
        self.keys.remove(key_id).is_some()
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.keys.contains_key(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl VerificationKeyResolver for KeyRing {
    fn resolve(&self, key_id: &str) -> Result<Option<PublicKey>, CryptoError> {
        Ok(self.keys.get(key_id).map(|k| k.value().clone()))
    }
}
