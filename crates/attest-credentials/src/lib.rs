//! Attest Credentials — builder, proof engine, credential store,
//! verification engine and QR presentation channel for permit credentials.

pub mod builder;
pub mod canonical;
pub mod credential;
pub mod error;
pub mod memory;
pub mod presentation;
pub mod proof;
pub mod service;
pub mod store;
pub mod validity;
pub mod verifier;

pub use builder::{CredentialBuilder, IdGenerator, UuidV7Generator};
pub use canonical::CanonicalBytes;
pub use credential::{Credential, CredentialSubject, VerifiableCredential};
pub use error::CredentialError;
pub use memory::InMemoryBackend;
pub use presentation::{render_qr_png, PresentationChannel, PresentationReference, VisualCode};
pub use proof::{Proof, ProofEngine, PROOF_PURPOSE, PROOF_TYPE};
pub use service::{CredentialService, DisplaySummary, IssueRequest, ResolvedPresentation};
pub use store::{apply_revocation, CredentialRecord, CredentialStore, StoreBackend};
pub use validity::ValidityPolicy;
pub use verifier::VerificationEngine;
