//! RocksDB store backend for the Attest node.
//!
//! Records are JSON in the `credentials` column family. Writes for the same
//! id are serialized through a striped set of async locks; RocksDB calls run
//! on the blocking pool.

use async_trait::async_trait;
use attest_core::Revocation;
use attest_credentials::{apply_revocation, CredentialError, CredentialRecord, StoreBackend};
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const CF_CREDENTIALS: &str = "credentials";
const LOCK_STRIPES: usize = 64;

pub struct RocksStore {
    db: Arc<DB>,
    locks: Vec<Mutex<()>>,
}

impl RocksStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_CREDENTIALS,
            Options::default(),
        )];
        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        })
    }

    fn stripe(&self, id: &str) -> &Mutex<()> {
        let digest = blake3::hash(id.as_bytes());
        let bytes = digest.as_bytes();
        let n = u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]);
        &self.locks[(n % LOCK_STRIPES as u64) as usize]
    }

    async fn read(&self, id: &str) -> Result<Option<CredentialRecord>, CredentialError> {
        let db = self.db.clone();
        let key = id.to_string();
        let raw = tokio::task::spawn_blocking(move || {
            let cf = db
                .cf_handle(CF_CREDENTIALS)
                .ok_or_else(|| unavailable("column family missing"))?;
            db.get_cf(&cf, key.as_bytes()).map_err(unavailable)
        })
        .await
        .map_err(unavailable)??;

        match raw {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, record: &CredentialRecord) -> Result<(), CredentialError> {
        let db = self.db.clone();
        let key = record.id().to_string();
        let value = serde_json::to_vec(record)?;
        tokio::task::spawn_blocking(move || {
            let cf = db
                .cf_handle(CF_CREDENTIALS)
                .ok_or_else(|| unavailable("column family missing"))?;
            db.put_cf(&cf, key.as_bytes(), value).map_err(unavailable)
        })
        .await
        .map_err(unavailable)?
    }
}

fn unavailable(e: impl std::fmt::Display) -> CredentialError {
    CredentialError::StoreUnavailable(format!("rocksdb: {}", e))
}

#[async_trait]
impl StoreBackend for RocksStore {
    async fn insert(&self, record: CredentialRecord) -> Result<(), CredentialError> {
        let _guard = self.stripe(record.id()).lock().await;
        if self.read(record.id()).await?.is_some() {
            return Err(CredentialError::Conflict(record.id().to_string()));
        }
        self.write(&record).await
    }

    async fn load(&self, id: &str) -> Result<Option<CredentialRecord>, CredentialError> {
        self.read(id).await
    }

    async fn revoke(
        &self,
        id: &str,
        revocation: Revocation,
    ) -> Result<CredentialRecord, CredentialError> {
        let _guard = self.stripe(id).lock().await;
        let mut record = self
            .read(id)
            .await?
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;
        if apply_revocation(&mut record, revocation)? {
            self.write(&record).await?;
        }
        Ok(record)
    }

    fn backend_name(&self) -> &str {
        "rocksdb"
    }
}
