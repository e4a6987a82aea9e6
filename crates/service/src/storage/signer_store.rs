use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use tracing::info;

use super::json_map_store::JsonMapStore;
use crate::errors::ServiceError;
use crate::neynar::SignerRecord;

/// Write-once cache of approved signers keyed by FID.
#[async_trait]
pub trait SignerStore: Send + Sync {
    /// Store `record` under `fid` unless an entry already exists.
    /// Returns `true` when the record was written.
    async fn put_if_absent(&self, fid: u64, record: SignerRecord) -> Result<bool, ServiceError>;

    async fn get(&self, fid: u64) -> Result<Option<SignerRecord>, ServiceError>;
}

/// Signer cache persisted as a JSON object `{ "<fid>": SignerRecord }`.
pub struct JsonFileSignerStore {
    inner: Arc<JsonMapStore<u64, SignerRecord>>,
}

impl JsonFileSignerStore {
    pub async fn open(path: &str) -> Result<Self, ServiceError> {
        let inner = JsonMapStore::new(path).await?;
        info!(%path, entries = inner.len().await, "signer cache loaded");
        Ok(Self { inner })
    }
}

#[async_trait]
impl SignerStore for JsonFileSignerStore {
    async fn put_if_absent(&self, fid: u64, record: SignerRecord) -> Result<bool, ServiceError> {
        self.inner.insert_if_absent(fid, record).await
    }

    async fn get(&self, fid: u64) -> Result<Option<SignerRecord>, ServiceError> {
        Ok(self.inner.get(&fid).await)
    }
}

#[derive(Default)]
pub struct MemorySignerStore {
    inner: DashMap<u64, SignerRecord>,
}

impl MemorySignerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl SignerStore for MemorySignerStore {
    async fn put_if_absent(&self, fid: u64, record: SignerRecord) -> Result<bool, ServiceError> {
        match self.inner.entry(fid) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn get(&self, fid: u64) -> Result<Option<SignerRecord>, ServiceError> {
        Ok(self.inner.get(&fid).map(|r| r.value().clone()))
    }
}

/// File-backed store for a non-empty path, in-memory otherwise.
pub async fn open_signer_store(path: &str) -> Result<Arc<dyn SignerStore>, ServiceError> {
    if path.trim().is_empty() {
        info!("signer cache kept in memory");
        return Ok(Arc::new(MemorySignerStore::new()));
    }
    Ok(Arc::new(JsonFileSignerStore::open(path).await?))
}
