// src/infrastructure/store/memory.rs
use crate::application::{
    ApplicationResult, error::ApplicationError, ports::kv_store::ExpiringKvStore, ports::time::Clock,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{sync::Mutex, task::JoinHandle};

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Process-local store for development and tests.
///
/// Expiry is absolute and read from the injected clock, so an expired entry is
/// invisible as soon as its deadline passes even if the sweeper has not run.
pub struct InMemoryKvStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryKvStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Periodically drop expired entries. The task ends once the store itself
    /// has been dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(store) = store.upgrade() else {
                    tracing::debug!("in-memory store dropped, sweeper exiting");
                    break;
                };
                let removed = store.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept expired entries");
                }
            }
        })
    }

    /// Remove expired entries now; returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live_at(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn deadline(&self, ttl: Duration) -> ApplicationResult<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|err| ApplicationError::infrastructure(err.to_string()))?;
        Ok(self.clock.now() + ttl)
    }
}

/// Live entry under `key`, evicting it first if it has expired.
fn live<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    now: DateTime<Utc>,
) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|entry| !entry.is_live_at(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

#[async_trait]
impl ExpiringKvStore for InMemoryKvStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> ApplicationResult<()> {
        let expires_at = Some(self.deadline(ttl)?);
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(live(&mut entries, key, now).map(|entry| entry.value.clone()))
    }

    async fn del(&self, key: &str) -> ApplicationResult<bool> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(entries
            .remove(key)
            .is_some_and(|entry| entry.is_live_at(now)))
    }

    async fn take(&self, key: &str) -> ApplicationResult<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(entries
            .remove(key)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.value))
    }

    async fn incr(&self, key: &str) -> ApplicationResult<i64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key, now) {
            Some(entry) => {
                let current: i64 = entry.value.parse().map_err(|_| {
                    ApplicationError::infrastructure(format!("value at {key} is not an integer"))
                })?;
                let next = current + 1;
                entry.value = next.to_string();
                Ok(next)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".into(),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> ApplicationResult<bool> {
        let deadline = self.deadline(ttl)?;
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(match live(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                true
            }
            None => false,
        })
    }

    async fn ttl(&self, key: &str) -> ApplicationResult<Option<Duration>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(live(&mut entries, key, now)
            .and_then(|entry| entry.expires_at)
            .and_then(|at| (at - now).to_std().ok()))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> ApplicationResult<bool> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        if live(&mut entries, key, now).is_some_and(|entry| entry.value == expected) {
            entries.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new_value: &str,
        ttl: Duration,
    ) -> ApplicationResult<bool> {
        let deadline = self.deadline(ttl)?;
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(match live(&mut entries, key, now) {
            Some(entry) if entry.value == expected => {
                entry.value = new_value.to_string();
                entry.expires_at = Some(deadline);
                true
            }
            _ => false,
        })
    }

    async fn delete_prefix(&self, prefix: &str) -> ApplicationResult<u64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let mut removed = 0u64;
        entries.retain(|key, entry| {
            if key.starts_with(prefix) {
                if entry.is_live_at(now) {
                    removed += 1;
                }
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}
