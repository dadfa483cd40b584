//! Link registry: issues short ids and resolves them back to decoy URLs

use std::sync::Arc;

use axum::http::HeaderValue;
use rand::RngExt;
use tracing::{debug, warn};

use crate::error::LinkError;
use crate::models::LinkRecord;
use crate::storage::{LinkStore, StorageError};

pub const LINK_ID_LEN: usize = 8;
pub const LINK_ID_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_ID_ATTEMPTS: usize = 10;

/// Generate a random link id, uniform over [`LINK_ID_ALPHABET`]
pub fn generate_link_id() -> String {
    let mut rng = rand::rng();
    (0..LINK_ID_LEN)
        .map(|_| LINK_ID_ALPHABET[rng.random_range(0..LINK_ID_ALPHABET.len())] as char)
        .collect()
}

pub struct LinkRegistry {
    store: Arc<dyn LinkStore>,
    generate_id: fn() -> String,
}

impl LinkRegistry {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self::with_id_generator(store, generate_link_id)
    }

    pub fn with_id_generator(store: Arc<dyn LinkStore>, generate_id: fn() -> String) -> Self {
        Self { store, generate_id }
    }

    /// Store a new link under a fresh id, retrying on collision
    pub async fn create_link(&self, destination_url: &str) -> Result<LinkRecord, LinkError> {
        let destination_url = destination_url.trim();
        if destination_url.is_empty() {
            return Err(LinkError::EmptyDestination);
        }
        // Must survive as a `Location` header later
        if HeaderValue::from_str(destination_url).is_err() {
            return Err(LinkError::InvalidDestination);
        }

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = (self.generate_id)();
            match self.store.insert(&id, destination_url).await {
                Ok(record) => {
                    debug!(id = %record.id, attempt, "link created");
                    return Ok(record);
                }
                Err(StorageError::Conflict) => {
                    warn!(id = %id, attempt, "link id collision, retrying");
                }
                Err(StorageError::Other(err)) => return Err(LinkError::Storage(err)),
            }
        }

        Err(LinkError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    /// Full record for an id
    pub async fn get(&self, id: &str) -> Result<LinkRecord, LinkError> {
        self.store.get(id).await?.ok_or(LinkError::NotFound)
    }

    /// Destination URL for an id
    pub async fn resolve(&self, id: &str) -> Result<String, LinkError> {
        self.get(id).await.map(|record| record.destination_url)
    }

    pub async fn count(&self) -> Result<usize, LinkError> {
        Ok(self.store.count().await?)
    }
}
