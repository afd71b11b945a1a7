//! In-memory [`KvStore`] implementation.
//!
//! Keeps every key in one `HashMap` behind a `std::sync::RwLock`. A batch
//! is applied under a single write guard, which is what makes it atomic for
//! concurrent readers; a failing batch is reverted command by command.
//! Expiry is checked lazily against the wall clock.
//!
//! Ordering matches Redis: descending score, ties broken by descending
//! member bytes.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::storage::{Command, KvStore, WriteBatch};

#[derive(Debug, Clone)]
enum Value {
    Set(BTreeSet<String>),
    SortedSet(HashMap<String, f64>),
    Hash(HashMap<String, String>),
    Counter(u64),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Set(_) => "set",
            Value::SortedSet(_) => "zset",
            Value::Hash(_) => "hash",
            Value::Counter(_) => "string",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Value::Set(s) => s.is_empty(),
            Value::SortedSet(z) => z.is_empty(),
            Value::Hash(h) => h.is_empty(),
            Value::Counter(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<i64>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: i64) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

type Keyspace = HashMap<String, Entry>;

/// Inverse of one applied command.
#[derive(Debug)]
enum Undo {
    Nothing,
    /// The key did not exist before the command
    Remove(String),
    Restore(String, Entry),
    SetMember {
        key: String,
        member: String,
    },
    Score {
        key: String,
        member: String,
        previous: Option<f64>,
    },
    Fields {
        key: String,
        previous: Vec<(String, Option<String>)>,
    },
    Expiry {
        key: String,
        previous: Option<i64>,
    },
}

/// Process-local store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Keyspace>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Keyspace>> {
        self.data
            .read()
            .map_err(|_| AppError::store("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Keyspace>> {
        self.data
            .write()
            .map_err(|_| AppError::store("memory store lock poisoned"))
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    fn live<'a>(data: &'a Keyspace, key: &str) -> Option<&'a Value> {
        data.get(key)
            .filter(|entry| entry.is_live(Self::now()))
            .map(|entry| &entry.value)
    }

    fn wrong_type(key: &str, expected: &str, found: &Value) -> AppError {
        AppError::store(format!(
            "WRONGTYPE key {key} holds a {} value, expected {expected}",
            found.kind()
        ))
    }

    fn set_mut<'a>(data: &'a mut Keyspace, key: &str) -> Result<&'a mut BTreeSet<String>> {
        Self::prepare(data, key, || Value::Set(BTreeSet::new()));
        match data.get_mut(key).map(|entry| &mut entry.value) {
            Some(Value::Set(set)) => Ok(set),
            Some(other) => Err(Self::wrong_type(key, "set", other)),
            None => Err(AppError::store(format!("key {key} vanished"))),
        }
    }

    fn zset_mut<'a>(data: &'a mut Keyspace, key: &str) -> Result<&'a mut HashMap<String, f64>> {
        Self::prepare(data, key, || Value::SortedSet(HashMap::new()));
        match data.get_mut(key).map(|entry| &mut entry.value) {
            Some(Value::SortedSet(zset)) => Ok(zset),
            Some(other) => Err(Self::wrong_type(key, "zset", other)),
            None => Err(AppError::store(format!("key {key} vanished"))),
        }
    }

    fn hash_mut<'a>(data: &'a mut Keyspace, key: &str) -> Result<&'a mut HashMap<String, String>> {
        Self::prepare(data, key, || Value::Hash(HashMap::new()));
        match data.get_mut(key).map(|entry| &mut entry.value) {
            Some(Value::Hash(hash)) => Ok(hash),
            Some(other) => Err(Self::wrong_type(key, "hash", other)),
            None => Err(AppError::store(format!("key {key} vanished"))),
        }
    }

    /// Make sure `key` holds a live value, replacing expired entries.
    fn prepare(data: &mut Keyspace, key: &str, init: impl FnOnce() -> Value) {
        let now = Self::now();
        let stale = data.get(key).is_some_and(|entry| !entry.is_live(now));
        if stale || !data.contains_key(key) {
            data.insert(key.to_string(), Entry::new(init()));
        }
    }

    /// Drop a key that a mutation left empty, as Redis does.
    fn drop_if_empty(data: &mut Keyspace, key: &str) {
        if data.get(key).is_some_and(|entry| entry.value.is_empty()) {
            data.remove(key);
        }
    }

    fn zset_snapshot(data: &Keyspace, key: &str) -> Result<Option<HashMap<String, f64>>> {
        match Self::live(data, key) {
            Some(Value::SortedSet(zset)) => Ok(Some(zset.clone())),
            Some(other) => Err(Self::wrong_type(key, "zset", other)),
            None => Ok(None),
        }
    }

    /// Members sorted by descending score, then descending member.
    fn sorted_desc(zset: &HashMap<String, f64>) -> Vec<(String, f64)> {
        let mut members: Vec<(String, f64)> =
            zset.iter().map(|(m, s)| (m.clone(), *s)).collect();
        members.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.0.cmp(&a.0))
        });
        members
    }

    fn store_zset(data: &mut Keyspace, dest: &str, result: HashMap<String, f64>) -> u64 {
        let count = result.len() as u64;
        if result.is_empty() {
            data.remove(dest);
        } else {
            data.insert(dest.to_string(), Entry::new(Value::SortedSet(result)));
        }
        count
    }

    /// Apply one command and return how to revert it. A failing command
    /// leaves existing keys untouched.
    fn apply_command(data: &mut Keyspace, command: &Command) -> Result<Undo> {
        let undo = match command {
            Command::SAdd { key, member } => {
                if Self::set_mut(data, key)?.insert(member.clone()) {
                    Undo::SetMember {
                        key: key.clone(),
                        member: member.clone(),
                    }
                } else {
                    Undo::Nothing
                }
            }
            Command::ZAdd { key, score, member } => {
                let previous = Self::zset_mut(data, key)?.insert(member.clone(), *score);
                Undo::Score {
                    key: key.clone(),
                    member: member.clone(),
                    previous,
                }
            }
            Command::ZIncrBy { key, delta, member } => {
                let zset = Self::zset_mut(data, key)?;
                let previous = zset.get(member).copied();
                *zset.entry(member.clone()).or_insert(0.0) += delta;
                Undo::Score {
                    key: key.clone(),
                    member: member.clone(),
                    previous,
                }
            }
            Command::HSet { key, fields } => {
                let hash = Self::hash_mut(data, key)?;
                let previous = fields
                    .iter()
                    .map(|(field, value)| (field.clone(), hash.insert(field.clone(), value.clone())))
                    .collect();
                Self::drop_if_empty(data, key);
                Undo::Fields {
                    key: key.clone(),
                    previous,
                }
            }
            Command::HIncrBy { key, field, delta } => {
                let previous = Self::hash_mut(data, key)?.get(field).cloned();
                Self::hincr(data, key, field, *delta)?;
                Undo::Fields {
                    key: key.clone(),
                    previous: vec![(field.clone(), previous)],
                }
            }
            Command::ExpireAt { key, timestamp } => {
                let now = Self::now();
                if *timestamp <= now {
                    match data.remove(key) {
                        Some(entry) => Undo::Restore(key.clone(), entry),
                        None => Undo::Nothing,
                    }
                } else if let Some(entry) = data.get_mut(key).filter(|entry| entry.is_live(now)) {
                    let previous = entry.expires_at.replace(*timestamp);
                    Undo::Expiry {
                        key: key.clone(),
                        previous,
                    }
                } else {
                    Undo::Nothing
                }
            }
        };
        Ok(undo)
    }

    /// Apply a batch in order. If any command fails, every earlier command
    /// is reverted and the error returned.
    fn apply_batch(data: &mut Keyspace, batch: &WriteBatch) -> Result<()> {
        let mut log = Vec::with_capacity(batch.len());
        for command in batch.commands() {
            let key = command.key();
            let fresh = Self::live(data, key).is_none();
            match Self::apply_command(data, command) {
                Ok(_) if fresh => log.push(Undo::Remove(key.to_string())),
                Ok(undo) => log.push(undo),
                Err(e) => {
                    if fresh {
                        data.remove(key);
                    }
                    Self::rollback(data, log);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn rollback(data: &mut Keyspace, log: Vec<Undo>) {
        for undo in log.into_iter().rev() {
            match undo {
                Undo::Nothing => {}
                Undo::Remove(key) => {
                    data.remove(&key);
                }
                Undo::Restore(key, entry) => {
                    data.insert(key, entry);
                }
                Undo::SetMember { key, member } => {
                    if let Some(Value::Set(set)) = data.get_mut(&key).map(|e| &mut e.value) {
                        set.remove(&member);
                    }
                }
                Undo::Score {
                    key,
                    member,
                    previous,
                } => {
                    if let Some(Value::SortedSet(zset)) = data.get_mut(&key).map(|e| &mut e.value) {
                        match previous {
                            Some(score) => zset.insert(member, score),
                            None => zset.remove(&member),
                        };
                    }
                }
                Undo::Fields { key, previous } => {
                    if let Some(Value::Hash(hash)) = data.get_mut(&key).map(|e| &mut e.value) {
                        for (field, value) in previous.into_iter().rev() {
                            match value {
                                Some(value) => hash.insert(field, value),
                                None => hash.remove(&field),
                            };
                        }
                    }
                }
                Undo::Expiry { key, previous } => {
                    if let Some(entry) = data.get_mut(&key) {
                        entry.expires_at = previous;
                    }
                }
            }
        }
    }

    fn hincr(data: &mut Keyspace, key: &str, field: &str, delta: i64) -> Result<i64> {
        let hash = Self::hash_mut(data, key)?;
        let current = match hash.get(field) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::store(format!("hash value {key}.{field} is not an integer")))?,
            None => 0,
        };
        let next = current + delta;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    fn combine(
        data: &Keyspace,
        keys: &[String],
        weights: &[f64],
        intersect: bool,
    ) -> Result<HashMap<String, f64>> {
        if weights.len() != keys.len() {
            return Err(AppError::store("weights must match the number of keys"));
        }

        let mut sources = Vec::with_capacity(keys.len());
        for key in keys {
            sources.push(Self::zset_snapshot(data, key)?.unwrap_or_default());
        }

        let mut result: HashMap<String, f64> = HashMap::new();
        if intersect {
            let Some((first, rest)) = sources.split_first() else {
                return Ok(result);
            };
            for member in first.keys() {
                if rest.iter().all(|zset| zset.contains_key(member)) {
                    let score = sources
                        .iter()
                        .zip(weights)
                        .map(|(zset, weight)| zset[member] * weight)
                        .sum();
                    result.insert(member.clone(), score);
                }
            }
        } else {
            for (zset, weight) in sources.iter().zip(weights) {
                for (member, score) in zset {
                    *result.entry(member.clone()).or_insert(0.0) += score * weight;
                }
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut data = self.write()?;
        Ok(Self::set_mut(&mut data, key)?.insert(member.to_string()))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut data = self.write()?;
        let present = match Self::live(&data, key) {
            Some(Value::Set(_)) => true,
            Some(other) => return Err(Self::wrong_type(key, "set", other)),
            None => false,
        };
        let removed = present && Self::set_mut(&mut data, key)?.remove(member);
        Self::drop_if_empty(&mut data, key);
        Ok(removed)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let data = self.read()?;
        match Self::live(&data, key) {
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(other) => Err(Self::wrong_type(key, "set", other)),
            None => Ok(false),
        }
    }

    async fn scard(&self, key: &str) -> Result<u64> {
        let data = self.read()?;
        match Self::live(&data, key) {
            Some(Value::Set(set)) => Ok(set.len() as u64),
            Some(other) => Err(Self::wrong_type(key, "set", other)),
            None => Ok(0),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let data = self.read()?;
        match Self::live(&data, key) {
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(Self::wrong_type(key, "set", other)),
            None => Ok(Vec::new()),
        }
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        let mut data = self.write()?;
        Self::prepare(&mut data, key, || Value::Counter(0));
        match data.get_mut(key).map(|entry| &mut entry.value) {
            Some(Value::Counter(n)) => {
                *n += 1;
                Ok(*n)
            }
            Some(other) => Err(Self::wrong_type(key, "string", other)),
            None => Err(AppError::store(format!("key {key} vanished"))),
        }
    }

    async fn counter(&self, key: &str) -> Result<u64> {
        let data = self.read()?;
        match Self::live(&data, key) {
            Some(Value::Counter(n)) => Ok(*n),
            Some(other) => Err(Self::wrong_type(key, "string", other)),
            None => Ok(0),
        }
    }

    async fn zincrby(&self, key: &str, delta: f64, member: &str) -> Result<f64> {
        let mut data = self.write()?;
        let score = Self::zset_mut(&mut data, key)?
            .entry(member.to_string())
            .or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: f64,
        min: f64,
        offset: usize,
        count: usize,
    ) -> Result<Vec<String>> {
        let data = self.read()?;
        let Some(zset) = Self::zset_snapshot(&data, key)? else {
            return Ok(Vec::new());
        };
        Ok(Self::sorted_desc(&zset)
            .into_iter()
            .filter(|(_, score)| *score >= min && *score <= max)
            .skip(offset)
            .take(count)
            .map(|(member, _)| member)
            .collect())
    }

    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>> {
        if stop < start {
            return Ok(Vec::new());
        }
        let data = self.read()?;
        let Some(zset) = Self::zset_snapshot(&data, key)? else {
            return Ok(Vec::new());
        };
        Ok(Self::sorted_desc(&zset)
            .into_iter()
            .skip(start)
            .take(stop - start + 1)
            .collect())
    }

    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut data = self.write()?;
        if Self::zset_snapshot(&data, key)?.is_none() {
            return Ok(0);
        }
        let zset = Self::zset_mut(&mut data, key)?;
        let before = zset.len();
        zset.retain(|_, score| *score < min || *score > max);
        let removed = (before - zset.len()) as u64;
        Self::drop_if_empty(&mut data, key);
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let data = self.read()?;
        Ok(Self::zset_snapshot(&data, key)?.map_or(0, |zset| zset.len() as u64))
    }

    async fn zunionstore(&self, dest: &str, keys: &[String], weights: &[f64]) -> Result<u64> {
        let mut data = self.write()?;
        let result = Self::combine(&data, keys, weights, false)?;
        Ok(Self::store_zset(&mut data, dest, result))
    }

    async fn zinterstore(&self, dest: &str, keys: &[String], weights: &[f64]) -> Result<u64> {
        let mut data = self.write()?;
        let result = Self::combine(&data, keys, weights, true)?;
        Ok(Self::store_zset(&mut data, dest, result))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let data = self.read()?;
        match Self::live(&data, key) {
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(other) => Err(Self::wrong_type(key, "hash", other)),
            None => Ok(HashMap::new()),
        }
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut data = self.write()?;
        Self::hincr(&mut data, key, field, delta)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let data = self.read()?;
        Ok(Self::live(&data, key).is_some())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut data = self.write()?;
        let was_live = Self::live(&data, key).is_some();
        data.remove(key);
        Ok(was_live)
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut data = self.write()?;
        Self::apply_batch(&mut data, &batch)
    }

    async fn apply_if_exists(&self, guard: &str, batch: WriteBatch) -> Result<bool> {
        let mut data = self.write()?;
        if Self::live(&data, guard).is_none() {
            return Ok(false);
        }
        Self::apply_batch(&mut data, &batch)?;
        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_set_operations() {
        let store = MemoryStore::new();
        assert!(store.sadd("s", "a").await.unwrap());
        assert!(!store.sadd("s", "a").await.unwrap());
        assert!(store.sismember("s", "a").await.unwrap());
        assert_eq!(store.scard("s").await.unwrap(), 1);
        assert!(store.srem("s", "a").await.unwrap());
        assert!(!store.exists("s").await.unwrap());
    }

    #[tokio::test]
    async fn test_revrange_by_score_with_limit() {
        let store = MemoryStore::new();
        for (member, score) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)] {
            store.zadd("z", score, member).await.unwrap();
        }

        let all = store.zrevrangebyscore("z", 4.0, 1.0, 0, 10).await.unwrap();
        assert_eq!(all, keys(&["d", "c", "b", "a"]));

        let window = store.zrevrangebyscore("z", 3.0, 2.0, 0, 10).await.unwrap();
        assert_eq!(window, keys(&["c", "b"]));

        let page = store.zrevrangebyscore("z", 4.0, 1.0, 1, 2).await.unwrap();
        assert_eq!(page, keys(&["c", "b"]));
    }

    #[tokio::test]
    async fn test_ties_break_by_reverse_member_order() {
        let store = MemoryStore::new();
        store.zadd("z", 1.0, "feed:item:1").await.unwrap();
        store.zadd("z", 1.0, "feed:item:2").await.unwrap();

        let ranked = store.zrevrange_withscores("z", 0, 1).await.unwrap();
        assert_eq!(ranked[0].0, "feed:item:2");
        assert_eq!(ranked[1].0, "feed:item:1");
    }

    #[tokio::test]
    async fn test_union_and_weighted_intersection() {
        let store = MemoryStore::new();
        store.zincrby("day1", 2.0, "x").await.unwrap();
        store.zincrby("day2", 3.0, "x").await.unwrap();
        store.zincrby("day2", 1.0, "y").await.unwrap();
        store.zadd("category", 20260101000000.0, "x").await.unwrap();

        let n = store
            .zunionstore("window", &keys(&["day1", "day2", "missing"]), &[1.0, 1.0, 1.0])
            .await
            .unwrap();
        assert_eq!(n, 2);
        let ranked = store.zrevrange_withscores("window", 0, 10).await.unwrap();
        assert_eq!(ranked, vec![("x".to_string(), 5.0), ("y".to_string(), 1.0)]);

        store
            .zinterstore("scoped", &keys(&["category", "window"]), &[0.0, 1.0])
            .await
            .unwrap();
        let scoped = store.zrevrange_withscores("scoped", 0, 10).await.unwrap();
        assert_eq!(scoped, vec![("x".to_string(), 5.0)]);
    }

    #[tokio::test]
    async fn test_empty_union_removes_destination() {
        let store = MemoryStore::new();
        store.zadd("window", 1.0, "stale").await.unwrap();
        let n = store.zunionstore("window", &keys(&["none"]), &[1.0]).await.unwrap();
        assert_eq!(n, 0);
        assert!(!store.exists("window").await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_at_in_past_removes_key() {
        let store = MemoryStore::new();
        store
            .hset_multiple("h", vec![("a".into(), "1".into())])
            .await
            .unwrap();
        store.expire_at("h", Utc::now().timestamp() - 1).await.unwrap();
        assert!(!store.exists("h").await.unwrap());
        assert!(store.hgetall("h").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expire_at_in_future_keeps_key() {
        let store = MemoryStore::new();
        store
            .hset_multiple("h", vec![("a".into(), "1".into())])
            .await
            .unwrap();
        store.expire_at("h", Utc::now().timestamp() + 3600).await.unwrap();
        assert!(store.exists("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing() {
        let store = MemoryStore::new();
        store.sadd("s", "a").await.unwrap();

        let mut batch = WriteBatch::new();
        batch.zadd("z", 1.0, "m").hincrby("s", "field", 1);
        assert!(store.apply(batch).await.is_err());
        assert!(!store.exists("z").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_batch_restores_touched_keys() {
        let store = MemoryStore::new();
        store.sadd("s", "a").await.unwrap();
        store.zadd("z", 1.0, "m").await.unwrap();
        store
            .hset_multiple("h", vec![("n".into(), "1".into())])
            .await
            .unwrap();
        store.expire_at("h", Utc::now().timestamp() + 3600).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .hincrby("h", "n", 5)
            .hset("h", vec![("title".into(), "Foo".into())])
            .sadd("s", "b")
            .zincrby("z", 2.0, "m")
            .zadd("z", 3.0, "new")
            .expire_at("h", Utc::now().timestamp() - 1)
            .hincrby("s", "field", 1);
        assert!(store.apply(batch).await.is_err());

        let hash = store.hgetall("h").await.unwrap();
        assert_eq!(hash.len(), 1);
        assert_eq!(hash["n"], "1");
        assert!(!store.sismember("s", "b").await.unwrap());
        assert_eq!(
            store.zrevrange_withscores("z", 0, 10).await.unwrap(),
            vec![("m".to_string(), 1.0)]
        );
    }

    #[tokio::test]
    async fn test_apply_if_exists() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.hincrby("h", "n", 1).zincrby("rank", 1.0, "h");

        assert!(!store.apply_if_exists("h", batch.clone()).await.unwrap());
        assert!(!store.exists("h").await.unwrap());
        assert!(!store.exists("rank").await.unwrap());

        store
            .hset_multiple("h", vec![("n".into(), "1".into())])
            .await
            .unwrap();
        assert!(store.apply_if_exists("h", batch).await.unwrap());
        assert_eq!(store.hgetall("h").await.unwrap()["n"], "2");
    }

    #[tokio::test]
    async fn test_apply_if_exists_ignores_expired_guard() {
        let store = MemoryStore::new();
        store
            .hset_multiple("h", vec![("n".into(), "1".into())])
            .await
            .unwrap();
        store.expire_at("h", Utc::now().timestamp() - 1).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.hincrby("h", "n", 1);
        assert!(!store.apply_if_exists("h", batch).await.unwrap());
        assert!(!store.exists("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_counters() {
        let store = MemoryStore::new();
        assert_eq!(store.counter("seq").await.unwrap(), 0);
        assert_eq!(store.incr("seq").await.unwrap(), 1);
        assert_eq!(store.incr("seq").await.unwrap(), 2);
        assert_eq!(store.hincrby("h", "n", 1).await.unwrap(), 1);
        assert_eq!(store.hincrby("h", "n", 1).await.unwrap(), 2);
    }
}
