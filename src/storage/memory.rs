use crate::models::LinkRecord;
use crate::storage::{LinkStore, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Process-lifetime link store backed by a sharded concurrent map
#[derive(Default)]
pub struct MemoryStorage {
    links: DashMap<String, LinkRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for MemoryStorage {
    async fn insert(&self, id: &str, destination_url: &str) -> StorageResult<LinkRecord> {
        match self.links.entry(id.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict),
            Entry::Vacant(slot) => {
                let record = LinkRecord {
                    id: id.to_string(),
                    destination_url: destination_url.to_string(),
                    created_at: chrono::Utc::now().timestamp(),
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<LinkRecord>> {
        Ok(self.links.get(id).map(|entry| entry.value().clone()))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.links.len())
    }
}
