//! Key-value store abstraction for feed persistence.
//!
//! The engine needs a store with set, sorted-set and hash primitives plus
//! key expiry and an atomic multi-command batch. [`KvStore`] names exactly
//! those operations so the ingestion and retrieval code never depends on a
//! particular transport.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: process-local, used by tests and `--memory` dry runs
//! - [`RedisStore`]: pooled Redis connections (feature `redis`)
//!
//! ## Key Layout
//!
//! ```text
//! feed:exists                      # set of canonical links
//! feed:seq                         # identity sequence
//! feed:time                        # zset item key -> time score
//! feed:time:{category}             # per-category time index
//! feed:item:{id}                   # item record (hash, expires)
//! feed:rank:{YYYYMMDD}             # day bucket, item key -> clicks
//! feed:rank:days:{n}               # n-day window (rebuilt on read)
//! feed:rank:days:{category}:{n}    # category-scoped window
//! dict:exists                      # set of dictionary keywords
//! dict:item:{keyword}              # dictionary detail (hash)
//! ```

pub mod keys;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// A single write submitted as part of a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SAdd {
        key: String,
        member: String,
    },
    ZAdd {
        key: String,
        score: f64,
        member: String,
    },
    ZIncrBy {
        key: String,
        delta: f64,
        member: String,
    },
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    HIncrBy {
        key: String,
        field: String,
        delta: i64,
    },
    ExpireAt {
        key: String,
        timestamp: i64,
    },
}

impl Command {
    /// The key this command writes.
    pub fn key(&self) -> &str {
        match self {
            Command::SAdd { key, .. }
            | Command::ZAdd { key, .. }
            | Command::ZIncrBy { key, .. }
            | Command::HSet { key, .. }
            | Command::HIncrBy { key, .. }
            | Command::ExpireAt { key, .. } => key,
        }
    }

    /// Command name followed by its arguments, as sent to Redis.
    pub fn args(&self) -> Vec<String> {
        match self {
            Command::SAdd { key, member } => vec!["SADD".into(), key.clone(), member.clone()],
            Command::ZAdd { key, score, member } => {
                vec!["ZADD".into(), key.clone(), score.to_string(), member.clone()]
            }
            Command::ZIncrBy { key, delta, member } => {
                vec!["ZINCRBY".into(), key.clone(), delta.to_string(), member.clone()]
            }
            Command::HSet { key, fields } => {
                let mut args = vec!["HSET".to_string(), key.clone()];
                for (field, value) in fields {
                    args.push(field.clone());
                    args.push(value.clone());
                }
                args
            }
            Command::HIncrBy { key, field, delta } => {
                vec!["HINCRBY".into(), key.clone(), field.clone(), delta.to_string()]
            }
            Command::ExpireAt { key, timestamp } => {
                vec!["EXPIREAT".into(), key.clone(), timestamp.to_string()]
            }
        }
    }
}

/// Ordered group of writes applied atomically by [`KvStore::apply`].
///
/// Readers observe either none or all of the commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    commands: Vec<Command>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sadd(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.commands.push(Command::SAdd {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn zadd(
        &mut self,
        key: impl Into<String>,
        score: f64,
        member: impl Into<String>,
    ) -> &mut Self {
        self.commands.push(Command::ZAdd {
            key: key.into(),
            score,
            member: member.into(),
        });
        self
    }

    pub fn zincrby(
        &mut self,
        key: impl Into<String>,
        delta: f64,
        member: impl Into<String>,
    ) -> &mut Self {
        self.commands.push(Command::ZIncrBy {
            key: key.into(),
            delta,
            member: member.into(),
        });
        self
    }

    pub fn hset(&mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> &mut Self {
        self.commands.push(Command::HSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn hincrby(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        delta: i64,
    ) -> &mut Self {
        self.commands.push(Command::HIncrBy {
            key: key.into(),
            field: field.into(),
            delta,
        });
        self
    }

    pub fn expire_at(&mut self, key: impl Into<String>, timestamp: i64) -> &mut Self {
        self.commands.push(Command::ExpireAt {
            key: key.into(),
            timestamp,
        });
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Trait for key-value store backends.
///
/// Missing keys behave like empty collections, matching Redis semantics:
/// reads return empty results rather than errors.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Add a member to a set. Returns `true` if it was not present before.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool>;

    /// Remove a member from a set. Returns `true` if it was present.
    async fn srem(&self, key: &str, member: &str) -> Result<bool>;

    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    async fn scard(&self, key: &str) -> Result<u64>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Atomically increment an integer counter, returning the new value.
    async fn incr(&self, key: &str) -> Result<u64>;

    /// Current value of an integer counter (0 when missing).
    async fn counter(&self, key: &str) -> Result<u64>;

    async fn zincrby(&self, key: &str, delta: f64, member: &str) -> Result<f64>;

    /// Members with `min <= score <= max`, highest score first, after
    /// skipping `offset` and returning at most `count`.
    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: f64,
        min: f64,
        offset: usize,
        count: usize,
    ) -> Result<Vec<String>>;

    /// Members ranked `start..=stop` by descending score, with scores.
    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>>;

    /// Remove members with `min <= score <= max`. Returns the removed count.
    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<u64>;

    async fn zcard(&self, key: &str) -> Result<u64>;

    /// Store the weighted sum-union of `keys` into `dest`, replacing it.
    async fn zunionstore(&self, dest: &str, keys: &[String], weights: &[f64]) -> Result<u64>;

    /// Store the weighted sum-intersection of `keys` into `dest`, replacing it.
    async fn zinterstore(&self, dest: &str, keys: &[String], weights: &[f64]) -> Result<u64>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn del(&self, key: &str) -> Result<bool>;

    /// Apply every command of the batch as one atomic unit.
    async fn apply(&self, batch: WriteBatch) -> Result<()>;

    /// Apply the batch atomically only if `guard` exists at that moment.
    /// Returns whether it was applied.
    async fn apply_if_exists(&self, guard: &str, batch: WriteBatch) -> Result<bool>;

    /// Liveness probe.
    async fn ping(&self) -> Result<()>;

    async fn hset_multiple(&self, key: &str, fields: Vec<(String, String)>) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.hset(key, fields);
        self.apply(batch).await
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.zadd(key, score, member);
        self.apply(batch).await
    }

    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.expire_at(key, timestamp);
        self.apply(batch).await
    }
}
