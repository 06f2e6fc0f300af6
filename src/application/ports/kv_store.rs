// src/application/ports/kv_store.rs
use crate::application::ApplicationResult;
use async_trait::async_trait;
use std::time::Duration;

/// Shared key-value storage with per-key expiry.
///
/// Every component of the authorization core keeps its state here and nowhere
/// else, so each operation below must be atomic at the store level. An expired
/// key is indistinguishable from an absent one.
#[async_trait]
pub trait ExpiringKvStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> ApplicationResult<()>;

    async fn get(&self, key: &str) -> ApplicationResult<Option<String>>;

    /// Returns whether a live key was removed.
    async fn del(&self, key: &str) -> ApplicationResult<bool>;

    /// Atomically read and remove `key`. Of several concurrent callers at most
    /// one observes the value.
    async fn take(&self, key: &str) -> ApplicationResult<Option<String>>;

    /// Increment the integer under `key` (absent counts as 0) and return the
    /// new value. An existing TTL is preserved; a fresh key has none.
    async fn incr(&self, key: &str) -> ApplicationResult<i64>;

    /// Returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> ApplicationResult<bool>;

    /// Remaining lifetime, `None` for absent keys or keys without expiry.
    async fn ttl(&self, key: &str) -> ApplicationResult<Option<Duration>>;

    /// Remove `key` only if it currently holds exactly `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> ApplicationResult<bool>;

    /// Replace `key` with `new_value` (and `ttl`) only if it currently holds
    /// exactly `expected`.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new_value: &str,
        ttl: Duration,
    ) -> ApplicationResult<bool>;

    /// Remove every key starting with `prefix`; returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> ApplicationResult<u64>;
}
