//! Key-value caching with expiry.
//!
//! [`CacheStore`] is the raw string backend (in-process or Redis);
//! [`TtlCache`] adds a key namespace, JSON encoding and a default TTL on top.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every key starting with `prefix`; returns how many were removed
    async fn clear_prefix(&self, prefix: &str) -> Result<usize>;

    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}

/// Namespaced JSON cache with a default expiry.
///
/// Backend failures never reach the caller: reads degrade to misses and
/// writes report `false`.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn CacheStore>,
    namespace: String,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(store: Arc<dyn CacheStore>, namespace: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            default_ttl,
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let raw = match self.store.get(&full_key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.set_json_with_ttl(key, value, self.default_ttl).await
    }

    pub async fn set_json_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let full_key = self.full_key(key);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Cache value not serializable");
                return false;
            }
        };

        match self.store.set(&full_key, raw, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Cache write failed");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let full_key = self.full_key(key);
        match self.store.delete(&full_key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Cache delete failed");
                false
            }
        }
    }

    /// Drop every entry in this namespace
    pub async fn clear(&self) -> usize {
        match self.store.clear_prefix(&self.namespace).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, error = %e, "Cache clear failed");
                0
            }
        }
    }

    /// Cached value for `key`, or the result of `f` stored with the default TTL.
    /// Errors from `f` are returned and nothing is cached.
    pub async fn get_or_insert_with<T, E, F, Fut>(&self, key: &str, f: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(hit) = self.get_json(key).await {
            return Ok(hit);
        }

        let value = f().await?;
        self.set_json(key, &value).await;
        Ok(value)
    }
}
