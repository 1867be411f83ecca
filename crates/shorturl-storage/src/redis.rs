use async_trait::async_trait;
use redis::AsyncCommands;
use shorturl_core::store::Result;
use shorturl_core::{KeyTtl, KeyValueStore, StorageError};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A Redis-backed implementation of [`KeyValueStore`].
///
/// All TTLs are handled with millisecond precision (`PEXPIRE`, `PTTL`,
/// `SET .. PX`).
#[derive(Debug, Clone)]
pub struct RedisStore {
    conn: redis::aio::MultiplexedConnection,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        StorageError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Operation(message)
    }
}

/// Interprets a `PTTL` reply.
fn ttl_from_reply(millis: i64) -> KeyTtl {
    match millis {
        -1 => KeyTtl::Persistent,
        ms if ms < 0 => KeyTtl::Missing,
        ms => KeyTtl::Expiring(Duration::from_millis(ms as u64)),
    }
}

fn to_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

impl RedisStore {
    /// Creates a store over an existing multiplexed connection.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Opens a multiplexed connection to the Redis server at `dsn`.
    ///
    /// The DSN has the form `redis://[<user>][:<password>@]<host>[:<port>][/<db>]`.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let client = redis::Client::open(dsn)
            .map_err(|e| StorageError::Operation(format!("invalid redis dsn: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        debug!("connected to Redis");
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!(key = %key, "GET");

        let mut conn = self.conn.clone();
        let raw = conn.get::<_, Option<Vec<u8>>>(key).await.map_err(|e| {
            warn!(key = %key, error = %e, "Redis error on get");
            map_redis_error("failed to fetch value from Redis", e)
        })?;

        raw.map(|bytes| {
            String::from_utf8(bytes).map_err(|e| {
                StorageError::InvalidData(format!("value at '{key}' is not UTF-8: {e}"))
            })
        })
        .transpose()
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        trace!(keys = entries.len(), "MSET");

        let mut cmd = redis::cmd("MSET");
        for (key, value) in entries {
            cmd.arg(key).arg(value);
        }

        let mut conn = self.conn.clone();
        let reply: redis::RedisResult<()> = cmd.query_async(&mut conn).await;
        reply.map_err(|e| {
            warn!(error = %e, "Redis error on mset");
            map_redis_error("failed to write values to Redis", e)
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        trace!(key = %key, ttl_ms = to_millis(ttl), "PEXPIRE");

        let mut conn = self.conn.clone();
        let reply: redis::RedisResult<i64> = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(to_millis(ttl))
            .query_async(&mut conn)
            .await;
        reply.map(|updated| updated == 1).map_err(|e| {
            warn!(key = %key, error = %e, "Redis error on pexpire");
            map_redis_error("failed to set expiry in Redis", e)
        })
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        trace!(key = %key, "PTTL");

        let mut conn = self.conn.clone();
        let reply: redis::RedisResult<i64> =
            redis::cmd("PTTL").arg(key).query_async(&mut conn).await;
        reply.map(ttl_from_reply).map_err(|e| {
            warn!(key = %key, error = %e, "Redis error on pttl");
            map_redis_error("failed to read expiry from Redis", e)
        })
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        // PX rejects a zero expiry
        let ttl_ms = to_millis(ttl).max(1);
        trace!(key = %key, ttl_ms, "SET NX PX");

        let mut conn = self.conn.clone();
        let reply: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await;
        reply.map(|ok| ok.is_some()).map_err(|e| {
            warn!(key = %key, error = %e, "Redis error on set nx");
            map_redis_error("failed to set key in Redis", e)
        })
    }
}
