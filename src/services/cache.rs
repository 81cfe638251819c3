use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

/// Identifies a cached API query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Me,
    Dentists,
    Appointments,
    Availability { dentist_id: String, date: NaiveDate },
}

struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

/// Shared response cache, invalidated explicitly after mutations.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        match serde_json::from_value(entry.value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Discarding cached {:?}: {}", key, e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.write().await.insert(
                    key,
                    CacheEntry {
                        value,
                        stored_at: Instant::now(),
                    },
                );
            }
            Err(e) => tracing::warn!("Failed to cache {:?}: {}", key, e),
        }
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        self.entries.write().await.remove(key);
    }

    /// Drop every availability entry, for all dentists and days.
    pub async fn invalidate_availability(&self) {
        self.entries
            .write()
            .await
            .retain(|k, _| !matches!(k, QueryKey::Availability { .. }));
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
