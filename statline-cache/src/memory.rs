//! In-memory cache store.
//!
//! Holds blobs in an ordered map behind a tokio `RwLock`. Provider TTLs are
//! honoured lazily: expired blobs are invisible to `get` and `list` and are
//! reclaimed on the next write to the same key or by [`InMemoryCacheStore::purge_expired`].

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use statline_core::{now_millis, EpochMillis};

use crate::traits::{CacheResult, CacheStore, KeyInfo, KeyListPage};

/// Configuration for [`InMemoryCacheStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStoreConfig {
    /// Maximum number of keys returned by one `list` call.
    pub list_page_size: usize,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self {
            list_page_size: 1000,
        }
    }
}

impl InMemoryStoreConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// - `STATLINE_STORE_LIST_PAGE_SIZE`: keys per list page (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            list_page_size: std::env::var("STATLINE_STORE_LIST_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.list_page_size),
        }
    }

    pub fn with_list_page_size(mut self, size: usize) -> Self {
        self.list_page_size = size.max(1);
        self
    }
}

#[derive(Debug, Clone)]
struct StoredBlob {
    value: String,
    expires_at: EpochMillis,
}

impl StoredBlob {
    fn is_live(&self, now: EpochMillis) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: tokio::sync::RwLock<BTreeMap<String, StoredBlob>>,
    config: InMemoryStoreConfig,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InMemoryStoreConfig) -> Self {
        Self {
            entries: tokio::sync::RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Number of live blobs.
    pub async fn len(&self) -> usize {
        let now = now_millis();
        let entries = self.entries.read().await;
        entries.values().filter(|blob| blob.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every blob whose provider TTL has elapsed. Returns how many went.
    pub async fn purge_expired(&self) -> u64 {
        let now = now_millis();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, blob| blob.is_live(now));
        (before - entries.len()) as u64
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = now_millis();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|blob| blob.is_live(now))
            .map(|blob| blob.value.clone()))
    }

    async fn put(&self, key: &str, value: String, ttl_seconds: u64) -> CacheResult<()> {
        let ttl_ms = i64::try_from(ttl_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        let blob = StoredBlob {
            value,
            expires_at: now_millis().saturating_add(ttl_ms),
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), blob);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str, cursor: Option<&str>) -> CacheResult<KeyListPage> {
        let now = now_millis();
        let entries = self.entries.read().await;

        let start = match cursor {
            Some(cursor) => Bound::Excluded(cursor),
            None => Bound::Included(prefix),
        };

        let mut matching = entries
            .range::<str, _>((start, Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(_, blob)| blob.is_live(now));

        let page_size = self.config.list_page_size.max(1);
        let keys: Vec<KeyInfo> = matching
            .by_ref()
            .take(page_size)
            .map(|(name, blob)| KeyInfo {
                name: name.clone(),
                expiration: Some(blob.expires_at),
            })
            .collect();

        let is_complete = matching.next().is_none();
        let cursor = if is_complete {
            None
        } else {
            keys.last().map(|info| info.name.clone())
        };

        Ok(KeyListPage {
            keys,
            is_complete,
            cursor,
        })
    }
}
