//! Redis storage implementation.
//!
//! Connections are kept in a small idle pool. Each operation checks one out,
//! probes it with `PING` before first use, and hands it back when the
//! command completes. Connections that fail a command are dropped instead of
//! being returned.

use std::collections::HashMap;
use std::sync::LazyLock;

use ::redis::aio::MultiplexedConnection;
use ::redis::{Client, Cmd, FromRedisValue, Pipeline, Script};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::RedisConfig;
use crate::storage::{Command, KvStore, WriteBatch};

/// Runs the encoded commands only if `KEYS[1]` exists. `ARGV` holds each
/// command as its argument count followed by the arguments.
static GUARDED_BATCH: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return 0
end
local i = 1
while i <= #ARGV do
  local n = tonumber(ARGV[i])
  redis.call(unpack(ARGV, i + 1, i + n))
  i = i + n + 1
end
return 1
",
    )
});

/// Redis-backed store with a bounded idle connection pool.
pub struct RedisStore {
    client: Client,
    idle: Mutex<Vec<MultiplexedConnection>>,
    max_idle: usize,
}

impl RedisStore {
    /// Create a store for the configured server. No connection is opened yet.
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        Ok(Self {
            client,
            idle: Mutex::new(Vec::new()),
            max_idle: config.max_idle.max(1),
        })
    }

    /// Take a validated connection from the pool, dialing a new one if the
    /// pool is empty or every idle connection fails its probe.
    async fn checkout(&self) -> Result<MultiplexedConnection> {
        loop {
            let candidate = self.idle.lock().await.pop();
            let Some(mut conn) = candidate else {
                break;
            };
            let probe: ::redis::RedisResult<String> =
                ::redis::cmd("PING").query_async(&mut conn).await;
            match probe {
                Ok(_) => return Ok(conn),
                Err(e) => log::debug!("Dropping idle Redis connection: {}", e),
            }
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::store(format!("cannot connect to Redis: {e}")))?;
        Ok(conn)
    }

    async fn checkin(&self, conn: MultiplexedConnection) {
        let mut idle = self.idle.lock().await;
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T> {
        let mut conn = self.checkout().await?;
        let value: T = cmd.query_async(&mut conn).await?;
        self.checkin(conn).await;
        Ok(value)
    }

    async fn query_pipeline(&self, pipe: &Pipeline) -> Result<()> {
        let mut conn = self.checkout().await?;
        let _: () = pipe.query_async(&mut conn).await?;
        self.checkin(conn).await;
        Ok(())
    }

    /// Build the `numkeys key... WEIGHTS w...` tail shared by the store commands.
    fn combine_cmd(name: &str, dest: &str, keys: &[String], weights: &[f64]) -> Result<Cmd> {
        if weights.len() != keys.len() {
            return Err(AppError::store("weights must match the number of keys"));
        }
        let mut cmd = ::redis::cmd(name);
        cmd.arg(dest).arg(keys.len()).arg(keys);
        if !keys.is_empty() {
            cmd.arg("WEIGHTS").arg(weights);
        }
        Ok(cmd)
    }

    fn push_command(pipe: &mut Pipeline, command: &Command) {
        let args = command.args();
        if let Some((name, rest)) = args.split_first() {
            pipe.cmd(name).arg(rest).ignore();
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let added: i64 = self.query(::redis::cmd("SADD").arg(key).arg(member)).await?;
        Ok(added == 1)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let removed: i64 = self.query(::redis::cmd("SREM").arg(key).arg(member)).await?;
        Ok(removed == 1)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let found: i64 = self
            .query(::redis::cmd("SISMEMBER").arg(key).arg(member))
            .await?;
        Ok(found == 1)
    }

    async fn scard(&self, key: &str) -> Result<u64> {
        self.query(::redis::cmd("SCARD").arg(key)).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.query(::redis::cmd("SMEMBERS").arg(key)).await
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        self.query(::redis::cmd("INCR").arg(key)).await
    }

    async fn counter(&self, key: &str) -> Result<u64> {
        let value: Option<u64> = self.query(::redis::cmd("GET").arg(key)).await?;
        Ok(value.unwrap_or(0))
    }

    async fn zincrby(&self, key: &str, delta: f64, member: &str) -> Result<f64> {
        self.query(::redis::cmd("ZINCRBY").arg(key).arg(delta).arg(member))
            .await
    }

    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: f64,
        min: f64,
        offset: usize,
        count: usize,
    ) -> Result<Vec<String>> {
        self.query(
            ::redis::cmd("ZREVRANGEBYSCORE")
                .arg(key)
                .arg(max)
                .arg(min)
                .arg("LIMIT")
                .arg(offset)
                .arg(count),
        )
        .await
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
        self.query(
            ::redis::cmd("ZREVRANGE")
                .arg(key)
                .arg(start)
                .arg(stop)
                .arg("WITHSCORES"),
        )
        .await
    }

    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.query(::redis::cmd("ZREMRANGEBYSCORE").arg(key).arg(min).arg(max))
            .await
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        self.query(::redis::cmd("ZCARD").arg(key)).await
    }

    async fn zunionstore(&self, dest: &str, keys: &[String], weights: &[f64]) -> Result<u64> {
        if keys.is_empty() {
            self.del(dest).await?;
            return Ok(0);
        }
        let cmd = Self::combine_cmd("ZUNIONSTORE", dest, keys, weights)?;
        self.query(&cmd).await
    }

    async fn zinterstore(&self, dest: &str, keys: &[String], weights: &[f64]) -> Result<u64> {
        if keys.is_empty() {
            self.del(dest).await?;
            return Ok(0);
        }
        let cmd = Self::combine_cmd("ZINTERSTORE", dest, keys, weights)?;
        self.query(&cmd).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.query(::redis::cmd("HGETALL").arg(key)).await
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        self.query(::redis::cmd("HINCRBY").arg(key).arg(field).arg(delta))
            .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let count: i64 = self.query(::redis::cmd("EXISTS").arg(key)).await?;
        Ok(count > 0)
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let count: i64 = self.query(::redis::cmd("DEL").arg(key)).await?;
        Ok(count > 0)
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for command in batch.commands() {
            Self::push_command(&mut pipe, command);
        }
        self.query_pipeline(&pipe).await
    }

    async fn apply_if_exists(&self, guard: &str, batch: WriteBatch) -> Result<bool> {
        let mut invocation = GUARDED_BATCH.key(guard);
        for command in batch.commands() {
            let args = command.args();
            invocation.arg(args.len()).arg(args);
        }
        let mut conn = self.checkout().await?;
        let applied: i64 = invocation.invoke_async(&mut conn).await?;
        self.checkin(conn).await;
        Ok(applied == 1)
    }

    async fn ping(&self) -> Result<()> {
        let _: String = self.query(&::redis::cmd("PING")).await?;
        Ok(())
    }
}
