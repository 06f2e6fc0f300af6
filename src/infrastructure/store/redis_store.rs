// src/infrastructure/store/redis_store.rs
use crate::application::{
    ApplicationResult, error::ApplicationError, ports::kv_store::ExpiringKvStore,
};
use async_trait::async_trait;
use deadpool_redis::{Config as DeadpoolConfig, Connection, Pool, Runtime};
use std::time::Duration;

// Delete KEYS[1] when it holds ARGV[1].
const COMPARE_AND_DELETE: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    else
        return 0
    end
"#;

// Replace KEYS[1] with ARGV[2] for ARGV[3] seconds when it holds ARGV[1].
const COMPARE_AND_SWAP: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
        return 1
    else
        return 0
    end
"#;

const SCAN_BATCH: usize = 100;

/// Store shared by every instance of the service. All keys are namespaced
/// with a global prefix so several deployments can share one Redis.
#[derive(Clone)]
pub struct RedisKvStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisKvStore {
    /// Create a store from a redis URL (e.g. `redis://:password@host:6379/0`).
    pub fn from_url(url: &str, key_prefix: impl Into<String>) -> ApplicationResult<Self> {
        let pool = DeadpoolConfig::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| ApplicationError::infrastructure(err.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: key_prefix.into(),
        })
    }

    pub async fn ping(&self) -> ApplicationResult<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)?;
        Ok(())
    }

    async fn conn(&self) -> ApplicationResult<Connection> {
        self.pool.get().await.map_err(|err| {
            tracing::error!(error = %err, "redis pool exhausted or unreachable");
            ApplicationError::infrastructure(err.to_string())
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn infrastructure(err: redis::RedisError) -> ApplicationError {
    tracing::error!(error = %err, "redis command failed");
    ApplicationError::infrastructure(err.to_string())
}

/// Whole seconds, rounded up so a sub-second TTL never means "no expiry".
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs + 1
    } else {
        secs
    }
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ExpiringKvStore for RedisKvStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> ApplicationResult<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
        let mut conn = self.conn().await?;
        redis::cmd("GET")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)
    }

    async fn del(&self, key: &str) -> ApplicationResult<bool> {
        let mut conn = self.conn().await?;
        let removed: u64 = redis::cmd("DEL")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)?;
        Ok(removed > 0)
    }

    async fn take(&self, key: &str) -> ApplicationResult<Option<String>> {
        let mut conn = self.conn().await?;
        redis::cmd("GETDEL")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)
    }

    async fn incr(&self, key: &str) -> ApplicationResult<i64> {
        let mut conn = self.conn().await?;
        redis::cmd("INCR")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> ApplicationResult<bool> {
        let mut conn = self.conn().await?;
        let applied: i64 = redis::cmd("EXPIRE")
            .arg(self.key(key))
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)?;
        Ok(applied == 1)
    }

    async fn ttl(&self, key: &str) -> ApplicationResult<Option<Duration>> {
        let mut conn = self.conn().await?;
        let remaining: i64 = redis::cmd("TTL")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)?;
        // -2: absent, -1: no expiry
        Ok(u64::try_from(remaining).ok().map(Duration::from_secs))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> ApplicationResult<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = redis::cmd("EVAL")
            .arg(COMPARE_AND_DELETE)
            .arg(1)
            .arg(self.key(key))
            .arg(expected)
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)?;
        Ok(removed == 1)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new_value: &str,
        ttl: Duration,
    ) -> ApplicationResult<bool> {
        let mut conn = self.conn().await?;
        let replaced: i64 = redis::cmd("EVAL")
            .arg(COMPARE_AND_SWAP)
            .arg(1)
            .arg(self.key(key))
            .arg(expected)
            .arg(new_value)
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(infrastructure)?;
        Ok(replaced == 1)
    }

    async fn delete_prefix(&self, prefix: &str) -> ApplicationResult<u64> {
        let pattern = format!("{}*", escape_glob(&self.key(prefix)));
        let mut conn = self.conn().await?;
        let mut removed = 0u64;
        let mut cursor = 0u64;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(infrastructure)?;

            if !keys.is_empty() {
                let deleted: u64 = redis::cmd("DEL")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(infrastructure)?;
                removed += deleted;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_secs(Duration::from_secs(60)), 60);
        assert_eq!(ttl_secs(Duration::from_millis(1_500)), 2);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
    }

    #[test]
    fn glob_metacharacters_are_escaped() {
        assert_eq!(escape_glob("sso:token:"), "sso:token:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }
}
