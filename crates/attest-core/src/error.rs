use crate::status::CredentialStatus;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: CredentialStatus,
        to: CredentialStatus,
    },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
