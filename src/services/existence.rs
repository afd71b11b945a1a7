//! Existence set of canonical links.

use std::sync::Arc;

use crate::context::AppContext;
use crate::error::Result;
use crate::storage::{KvStore, keys};

/// Set membership of every link ever ingested.
#[derive(Clone)]
pub struct ExistenceIndex {
    store: Arc<dyn KvStore>,
}

impl ExistenceIndex {
    pub fn new(context: &AppContext) -> Self {
        Self {
            store: Arc::clone(&context.store),
        }
    }

    pub async fn exists(&self, link: &str) -> Result<bool> {
        self.store.sismember(keys::FEED_EXISTS, link).await
    }

    /// Register a link. Returns `false` when it was already present, which
    /// makes this the atomic claim for a link: exactly one caller gets `true`.
    pub async fn insert(&self, link: &str) -> Result<bool> {
        self.store.sadd(keys::FEED_EXISTS, link).await
    }

    /// Undo a claim whose item write failed.
    pub async fn release(&self, link: &str) -> Result<()> {
        self.store.srem(keys::FEED_EXISTS, link).await?;
        Ok(())
    }

    /// Number of distinct links registered. Expired items are still counted.
    pub async fn cardinality(&self) -> Result<u64> {
        self.store.scard(keys::FEED_EXISTS).await
    }
}
