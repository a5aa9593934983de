pub mod error;
pub mod hashing;
pub mod key_provider;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{hash, hash_hex, Hash};
pub use key_provider::{
    EnvKeyProvider, FileKeyProvider, KeyRing, LocalKeyProvider, SigningKeyProvider,
    VerificationKeyResolver,
};
pub use keys::{key_id_for, KeyPair, PublicKey};
pub use signing::{sign, verify, Signature};
