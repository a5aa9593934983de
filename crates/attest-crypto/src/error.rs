/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("key material could not be loaded: {0}")]
    KeyLoadError(String),

    #[error("verification key lookup unavailable: {0}")]
    KeyUnavailable(String),
}
