use async_trait::async_trait;
use attest_core::Revocation;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::CredentialError;
use crate::store::{apply_revocation, CredentialRecord, StoreBackend};

/// Process-local backend over a concurrent map. Records are lost on restart.
#[derive(Default)]
pub struct InMemoryBackend {
    records: DashMap<String, CredentialRecord>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn insert(&self, record: CredentialRecord) -> Result<(), CredentialError> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.records.entry(record.id().to_string()) {
            Entry::Occupied(e) => Err(CredentialError::Conflict(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(record);
                Ok(())
            }
        }
    }

    async fn load(&self, id: &str) -> Result<Option<CredentialRecord>, CredentialError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn revoke(
        &self,
        id: &str,
        revocation: Revocation,
    ) -> Result<CredentialRecord, CredentialError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;
        apply_revocation(&mut record, revocation)?;
        Ok(record.clone())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
