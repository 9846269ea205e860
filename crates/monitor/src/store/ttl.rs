use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::backend::{StoreBackend, StoreError};
use crate::metrics::MonitorMetrics;

/// Typed JSON facade over a [`StoreBackend`]. Backend and codec failures are
/// logged, counted, and reported to callers as a miss or a no-op.
#[derive(Clone)]
pub struct TtlStore {
    backend: Arc<dyn StoreBackend>,
    metrics: Arc<MonitorMetrics>,
}

impl TtlStore {
    pub fn new(backend: Arc<dyn StoreBackend>, metrics: Arc<MonitorMetrics>) -> Self {
        Self { backend, metrics }
    }

    fn degrade(&self, op: &str, key: &str, e: &StoreError) {
        self.metrics.inc_store_errors();
        tracing::warn!(op, key, error = %e, "store operation degraded");
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(v) => v?,
            Err(e) => {
                self.degrade("get", key, &e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                self.degrade("get", key, &StoreError::Codec(e));
                None
            }
        }
    }

    /// Returns whether the value reached the backend.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                self.degrade("set", key, &StoreError::Codec(e));
                return false;
            }
        };
        match self.backend.set(key, raw, ttl).await {
            Ok(()) => true,
            Err(e) => {
                self.degrade("set", key, &e);
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            self.degrade("delete", key, &e);
        }
    }

    /// Cache-aside read. Concurrent misses may each run `produce`.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, ttl: Option<Duration>, produce: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(hit) = self.get(key).await {
            return hit;
        }
        let value = produce().await;
        self.set(key, &value, ttl).await;
        value
    }

    pub async fn keys(&self, prefix: &str) -> Vec<String> {
        match self.backend.keys(prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                self.degrade("keys", prefix, &e);
                Vec::new()
            }
        }
    }

    /// Deletes every key under `prefix`, returning how many were removed.
    pub async fn invalidate_by_pattern(&self, prefix: &str) -> usize {
        let keys = self.keys(prefix).await;
        let mut removed = 0;
        for key in &keys {
            match self.backend.delete(key).await {
                Ok(()) => removed += 1,
                Err(e) => self.degrade("delete", key, &e),
            }
        }
        removed
    }

    /// Reads every live value under `prefix`, skipping misses.
    pub async fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Vec<(String, T)> {
        let mut out = Vec::new();
        for key in self.keys(prefix).await {
            if let Some(v) = self.get(&key).await {
                out.push((key, v));
            }
        }
        out
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }
}
