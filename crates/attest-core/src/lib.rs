//! Attest Core — Fundamental types, errors, configuration and time source
//! shared by the Attest permit credential engine.

pub mod clock;
pub mod config;
pub mod error;
pub mod status;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, MAX_PRESENTATION_TTL_SECS};
pub use error::CoreError;
pub use status::{CredentialStatus, CredentialStatusMachine, Transition};
pub use types::{
    Revocation, SubjectClaims, VerificationCheck, VerificationReason, VerificationResult,
    BASE_CREDENTIAL_TYPE, RESERVED_CLAIM_KEYS,
};
