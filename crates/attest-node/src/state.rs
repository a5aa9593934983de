//! Shared state handed to every HTTP handler.

use attest_credentials::CredentialService;
use std::sync::Arc;
use std::time::Instant;

pub struct AppState {
    /// The credential engine.
    pub service: Arc<CredentialService>,
    /// When the node started.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<CredentialService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
