//! In-process query cache with prefix invalidation.
//!
//! Entries are kept in key order, so every key starting with a prefix sits in
//! one contiguous range beginning at the prefix itself. Invalidation marks
//! that range stale and announces each affected key on a broadcast channel;
//! a refetcher subscribes to reload them.

use ashva_realtime_core::environment::QueryCache;
use ashva_realtime_core::key::QueryKey;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the invalidation announcement channel.
const ANNOUNCE_CAPACITY: usize = 256;

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedQuery {
    /// Last fetched value
    pub value: Value,
    /// Whether the value must be refetched before use
    pub stale: bool,
    /// When the value was stored
    pub fetched_at: DateTime<Utc>,
}

/// Thread-safe in-memory [`QueryCache`].
///
/// # Example
///
/// ```
/// use ashva_realtime_bridge::InMemoryQueryCache;
/// use ashva_realtime_core::environment::QueryCache;
/// use ashva_realtime_core::key::QueryKey;
/// use serde_json::json;
///
/// let cache = InMemoryQueryCache::new();
/// cache.insert(QueryKey::from(["tickets", "42"]), json!({"status": "open"}));
/// cache.insert(QueryKey::from(["payments"]), json!([]));
///
/// cache.invalidate(&QueryKey::from(["tickets"]));
///
/// assert_eq!(cache.is_stale(&QueryKey::from(["tickets", "42"])), Some(true));
/// assert_eq!(cache.is_stale(&QueryKey::from(["payments"])), Some(false));
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryQueryCache {
    entries: Arc<RwLock<BTreeMap<QueryKey, CachedQuery>>>,
    announcements: broadcast::Sender<QueryKey>,
}

impl InMemoryQueryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            announcements: broadcast::channel(ANNOUNCE_CAPACITY).0,
        }
    }

    /// Store a fresh value, replacing any previous entry.
    pub fn insert(&self, key: QueryKey, value: Value) {
        let entry = CachedQuery {
            value,
            stale: false,
            fetched_at: Utc::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, key: &QueryKey) -> Option<CachedQuery> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Whether the entry is stale; `None` if it is not cached.
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.get(key).map(|entry| entry.stale)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<QueryKey> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Receive every key marked stale from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.announcements.subscribe()
    }
}

impl Default for InMemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache for InMemoryQueryCache {
    fn invalidate(&self, prefix: &QueryKey) {
        let affected: Vec<QueryKey> = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries
                .range_mut(prefix.clone()..)
                .take_while(|(key, _)| prefix.is_prefix_of(key))
                .map(|(key, entry)| {
                    entry.stale = true;
                    key.clone()
                })
                .collect()
        };

        trace!(%prefix, affected = affected.len(), "Invalidated cached queries");

        for key in affected {
            // No subscribers is fine
            let _ = self.announcements.send(key);
        }
    }
}
