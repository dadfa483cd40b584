use crate::models::LinkRecord;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("link id already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Insert a link under `id`; `Conflict` if the id is taken.
    /// Check and insert happen atomically.
    async fn insert(&self, id: &str, destination_url: &str) -> StorageResult<LinkRecord>;

    /// Get a link by id
    async fn get(&self, id: &str) -> Result<Option<LinkRecord>>;

    /// Number of stored links
    async fn count(&self) -> Result<usize>;
}
