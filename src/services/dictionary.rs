// src/services/dictionary.rs

//! Keyword dictionary used to enrich matching feed entries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::AppContext;
use crate::error::Result;
use crate::models::DictionaryEntry;
use crate::storage::{KvStore, WriteBatch, keys};

/// Source of tracked keywords and their affiliate metadata.
#[async_trait]
pub trait Dictionary: Send + Sync {
    /// All keywords in matching order.
    async fn keywords(&self) -> Result<Vec<String>>;

    /// Metadata for a keyword. Unknown keywords yield empty fields.
    async fn detail(&self, keyword: &str) -> Result<DictionaryEntry>;
}

/// Dictionary kept in the store under `dict:exists` and `dict:item:{kw}`.
#[derive(Clone)]
pub struct StoreDictionary {
    store: Arc<dyn KvStore>,
}

impl StoreDictionary {
    pub fn new(context: &AppContext) -> Self {
        Self {
            store: Arc::clone(&context.store),
        }
    }

    /// Write entries to the store in one batch. Entries without a keyword
    /// are skipped. Returns the number written.
    pub async fn import(&self, entries: &[DictionaryEntry]) -> Result<usize> {
        let mut batch = WriteBatch::new();
        let mut written = 0;
        for entry in entries {
            let keyword = entry.keyword.trim();
            if keyword.is_empty() {
                log::warn!("Skipping dictionary entry without keyword");
                continue;
            }
            batch
                .sadd(keys::DICT_EXISTS, keyword)
                .hset(keys::dict_item(keyword), entry.to_fields());
            written += 1;
        }
        self.store.apply(batch).await?;
        log::info!("Imported {} dictionary entries", written);
        Ok(written)
    }
}

#[async_trait]
impl Dictionary for StoreDictionary {
    async fn keywords(&self) -> Result<Vec<String>> {
        let mut keywords = self.store.smembers(keys::DICT_EXISTS).await?;
        keywords.sort();
        Ok(keywords)
    }

    async fn detail(&self, keyword: &str) -> Result<DictionaryEntry> {
        let fields = self.store.hgetall(&keys::dict_item(keyword)).await?;
        Ok(DictionaryEntry::from_fields(keyword, &fields))
    }
}
