// tests/support/mocks/store.rs
use async_trait::async_trait;
use pkce_sso::application::{
    ApplicationResult, error::ApplicationError, ports::kv_store::ExpiringKvStore,
};
use std::time::Duration;

/// すべての操作が接続エラーになるストア
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

fn unavailable<T>() -> ApplicationResult<T> {
    Err(ApplicationError::infrastructure("store: connection refused"))
}

#[async_trait]
impl ExpiringKvStore for FailingStore {
    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> ApplicationResult<()> {
        unavailable()
    }

    async fn get(&self, _key: &str) -> ApplicationResult<Option<String>> {
        unavailable()
    }

    async fn del(&self, _key: &str) -> ApplicationResult<bool> {
        unavailable()
    }

    async fn take(&self, _key: &str) -> ApplicationResult<Option<String>> {
        unavailable()
    }

    async fn incr(&self, _key: &str) -> ApplicationResult<i64> {
        unavailable()
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> ApplicationResult<bool> {
        unavailable()
    }

    async fn ttl(&self, _key: &str) -> ApplicationResult<Option<Duration>> {
        unavailable()
    }

    async fn compare_and_delete(&self, _key: &str, _expected: &str) -> ApplicationResult<bool> {
        unavailable()
    }

    async fn compare_and_swap(
        &self,
        _key: &str,
        _expected: &str,
        _new_value: &str,
        _ttl: Duration,
    ) -> ApplicationResult<bool> {
        unavailable()
    }

    async fn delete_prefix(&self, _prefix: &str) -> ApplicationResult<u64> {
        unavailable()
    }
}
