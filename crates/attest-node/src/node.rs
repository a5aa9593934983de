//! The Attest node orchestrator.
//!
//! Picks the signing key provider and store backend from configuration,
//! wires the credential service and runs the HTTP API.

use anyhow::Result;
use attest_core::SystemClock;
use attest_credentials::{CredentialService, InMemoryBackend, StoreBackend};
use attest_crypto::{
    EnvKeyProvider, FileKeyProvider, KeyRing, LocalKeyProvider, PublicKey, SigningKeyProvider,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::{AttestConfig, StorageBackendKind};
use crate::state::AppState;

pub struct AttestNode {
    config: AttestConfig,
    state: Arc<AppState>,
    server: Option<JoinHandle<Result<()>>>,
}

impl AttestNode {
    /// Create a node: load the signing key, open storage, build the service.
    pub fn new(config: AttestConfig) -> Result<Self> {
        let signer = Self::signing_key_provider(&config)?;
        let backend = Self::store_backend(&config)?;

        let service = CredentialService::new(
            config.engine_config(),
            signer,
            Arc::new(KeyRing::new()),
            backend,
            Arc::new(SystemClock),
        )?;

        for did in &config.signing.retired_keys {
            let key = PublicKey::from_did_key(did)?;
            service.register_retired_key(key);
            tracing::info!(did = %did, "retired signing key registered");
        }

        tracing::info!(
            issuer = %service.issuer(),
            key_id = %service.key_id(),
            "Attest node created"
        );

        Ok(Self {
            config,
            state: Arc::new(AppState::new(Arc::new(service))),
            server: None,
        })
    }

    fn signing_key_provider(config: &AttestConfig) -> Result<Arc<dyn SigningKeyProvider>> {
        if let Some(var) = &config.signing.key_env {
            let provider = EnvKeyProvider::from_env(var)?;
            tracing::info!(var = %provider.var_name(), "signing key loaded from environment");
            return Ok(Arc::new(provider));
        }
        if let Some(path) = &config.signing.key_file {
            return Ok(Arc::new(FileKeyProvider::load_or_generate(path)?));
        }
        tracing::warn!("no signing key configured, using an ephemeral key");
        Ok(Arc::new(LocalKeyProvider::generate()))
    }

    fn store_backend(config: &AttestConfig) -> Result<Arc<dyn StoreBackend>> {
        match config.storage.backend {
            StorageBackendKind::Memory => {
                tracing::info!("using in-memory credential store");
                Ok(Arc::new(InMemoryBackend::new()))
            }
            #[cfg(feature = "rocksdb")]
            StorageBackendKind::Rocksdb => {
                let store = crate::storage::RocksStore::open(&config.storage.data_dir)?;
                tracing::info!(
                    path = %config.storage.data_dir.display(),
                    "rocksdb credential store opened"
                );
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "rocksdb"))]
            StorageBackendKind::Rocksdb => Err(anyhow::anyhow!(
                "storage backend 'rocksdb' requires building attest-node with --features rocksdb"
            )),
        }
    }

    /// Bind the API listener and start serving in the background.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let addr: SocketAddr = self.config.api_addr().parse()?;
        let listener = crate::api::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let state = self.state.clone();
        self.server = Some(tokio::spawn(crate::api::serve(listener, state)));
        Ok(local_addr)
    }

    /// Wait for the API server to exit.
    pub async fn run(&mut self) -> Result<()> {
        let server = self
            .server
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        server.await??;
        Ok(())
    }

    /// Stop serving.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Attest node");
        if let Some(server) = self.server.take() {
            server.abort();
        }
        tracing::info!("Attest node shut down");
        Ok(())
    }
}
