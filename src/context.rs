//! Explicit dependency bundle handed to every component.

use std::sync::Arc;

use crate::models::Config;
use crate::storage::{KvStore, MemoryStore};

/// Store handle plus configuration, cloned into each component.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn KvStore>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(store: Arc<dyn KvStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Context backed by a fresh process-local store.
    pub fn in_memory(config: Config) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    /// Context backed by Redis. Fails if the server does not answer a ping.
    #[cfg(feature = "redis")]
    pub async fn connect(config: Config) -> crate::error::Result<Self> {
        let store = crate::storage::RedisStore::new(&config.redis)?;
        store.ping().await?;
        log::info!("Connected to Redis at {}", config.redis.url);
        Ok(Self::new(Arc::new(store), config))
    }
}
