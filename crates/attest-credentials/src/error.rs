/// Credential engine errors.
///
/// Invalid credentials are not errors: verification reports them as a
/// [`attest_core::VerificationResult`]. These variants cover malformed input
/// and infrastructure faults only.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("credential already exists: {0}")]
    Conflict(String),

    #[error("credential not found: {0}")]
    NotFound(String),

    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("signature infrastructure error: {0}")]
    SignatureInfrastructure(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("core error: {0}")]
    Core(#[from] attest_core::CoreError),
}

impl CredentialError {
    /// Transient faults the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
