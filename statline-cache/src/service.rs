//! Read-through cache service with stale-while-revalidate metadata.
//!
//! This module implements the core caching logic: writing values together
//! with their freshness metadata, classifying reads as fresh, stale or missing,
//! and the `get_or_set` primitive the aggregation layer drives everything
//! through.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use statline_core::{now_millis, CacheError, ConfigError, EpochMillis};

use crate::freshness::{CacheEntry, CacheMetadata, CacheRead, Freshness};
use crate::key::CacheKeyType;
use crate::policy::TtlPolicy;
use crate::traits::{CacheResult, CacheStore};

/// Per-write options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Explicit TTL in seconds. Skips the policy lookup entirely.
    pub ttl_override: Option<u64>,
    /// Selects the in-season or off-season player stats TTL.
    pub is_active_season: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            ttl_override: None,
            is_active_season: true,
        }
    }
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit TTL.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_override = Some(ttl_secs);
        self
    }

    /// Set whether the season is running.
    pub fn with_active_season(mut self, is_active_season: bool) -> Self {
        self.is_active_season = is_active_season;
        self
    }
}

/// Cache service over a [`CacheStore`].
///
/// # Example
///
/// ```ignore
/// let cache = CacheService::new(Arc::new(InMemoryCacheStore::new()), Arc::new(TtlPolicy::default()));
///
/// let key = CacheKey::player_stats(player_id, Some(season_id));
/// let stats = cache
///     .get_or_set(key.as_str(), || async { compute_stats().await }, SetOptions::default())
///     .await?;
/// ```
///
/// Concurrent misses on the same key are not de-duplicated: each caller
/// computes and writes, and the last write wins.
pub struct CacheService<S>
where
    S: CacheStore,
{
    store: Arc<S>,
    policy: Arc<TtlPolicy>,
}

impl<S> CacheService<S>
where
    S: CacheStore,
{
    pub fn new(store: Arc<S>, policy: Arc<TtlPolicy>) -> Self {
        Self { store, policy }
    }

    /// Create a cache service with the default TTL policy.
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, Arc::new(TtlPolicy::default()))
    }

    /// Create a cache service, rejecting an invalid policy.
    pub fn try_new(store: Arc<S>, policy: Arc<TtlPolicy>) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self::new(store, policy))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    /// Read a value and classify its freshness as of now.
    ///
    /// Absent, corrupt and expired entries all come back as a miss. Only a
    /// failing store produces an error.
    pub async fn get<T>(&self, key: &str) -> CacheResult<CacheRead<T>>
    where
        T: DeserializeOwned,
    {
        self.get_at(key, now_millis()).await
    }

    /// [`CacheService::get`] with an explicit clock reading.
    pub async fn get_at<T>(&self, key: &str, now: EpochMillis) -> CacheResult<CacheRead<T>>
    where
        T: DeserializeOwned,
    {
        let read = match self.read_entry::<T>(key).await? {
            Some(entry) => CacheRead::from_entry(entry, now),
            None => CacheRead::miss(),
        };

        if read.is_stale() {
            tracing::debug!(key, "cache hit (stale)");
        } else if read.is_hit() {
            tracing::debug!(key, "cache hit");
        } else {
            tracing::debug!(key, "cache miss");
        }

        Ok(read)
    }

    /// Write a value with freshly computed metadata.
    ///
    /// The TTL comes from `options.ttl_override` when set, otherwise from the
    /// policy entry for the key's inferred type. The store receives the longer
    /// provider TTL so the entry survives its stale window. A zero TTL is
    /// rejected with [`CacheError::Write`] before anything is stored.
    pub async fn set<T>(&self, key: &str, value: &T, options: SetOptions) -> CacheResult<CacheMetadata>
    where
        T: Serialize,
    {
        let ttl_secs = options.ttl_override.unwrap_or_else(|| {
            self.policy
                .ttl_for(CacheKeyType::from_key(key), options.is_active_season)
        });
        if ttl_secs == 0 {
            return Err(CacheError::Write {
                key: key.to_string(),
                reason: "ttl must be greater than 0".to_string(),
            });
        }
        let metadata = CacheMetadata::new(
            now_millis(),
            ttl_secs,
            self.policy.stale_window_millis(ttl_secs),
        );

        let entry = CacheEntry::new(value, metadata);
        let blob = entry.encode().map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let provider_ttl = self.policy.provider_ttl_secs(ttl_secs);
        self.store.put(key, blob, provider_ttl).await.map_err(|e| {
            tracing::warn!(key, error = %e, "cache write failed");
            e
        })?;

        tracing::debug!(key, ttl_secs, provider_ttl, "cache write");
        Ok(metadata)
    }

    /// Return the cached value, computing and storing it on a miss.
    ///
    /// Fresh and stale entries are both served without calling `compute`;
    /// nothing refreshes a stale entry in the background. Only an absent,
    /// corrupt or expired entry runs `compute`, exactly once, and its result
    /// is written through [`CacheService::set`].
    ///
    /// Errors returned by `compute` are passed through untouched, so callers
    /// can tell them apart from the [`CacheError`]s raised by the store.
    pub async fn get_or_set<T, E, F, Fut>(&self, key: &str, compute: F, options: SetOptions) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(entry) = self.read_entry::<T>(key).await? {
            match entry.metadata.freshness_at(now_millis()) {
                Freshness::Fresh => {
                    tracing::debug!(key, "cache hit");
                    return Ok(entry.value);
                }
                Freshness::Stale => {
                    tracing::debug!(key, "cache hit (stale), serving without refresh");
                    return Ok(entry.value);
                }
                Freshness::Expired => {
                    tracing::debug!(key, "cache entry expired");
                }
            }
        } else {
            tracing::debug!(key, "cache miss");
        }

        let value = compute().await?;
        self.set(key, &value, options).await?;
        Ok(value)
    }

    /// Delete one entry. Deleting an absent key is not an error.
    pub async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.store.delete(key).await?;
        tracing::debug!(key, "cache invalidate");
        Ok(())
    }

    /// Delete every entry whose key starts with `prefix`.
    ///
    /// Lists every page first, then deletes. The two steps are not atomic: a
    /// key written while this runs may survive. Returns the number of keys
    /// deleted.
    pub async fn invalidate_by_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.store.list(prefix, cursor.as_deref()).await?;
            keys.extend(page.keys.into_iter().map(|info| info.name));
            if page.is_complete || page.cursor.is_none() {
                break;
            }
            cursor = page.cursor;
        }

        for key in &keys {
            self.store.delete(key).await?;
        }

        tracing::info!(prefix, deleted = keys.len(), "cache invalidate by prefix");
        Ok(keys.len() as u64)
    }

    async fn read_entry<T>(&self, key: &str) -> CacheResult<Option<CacheEntry<T>>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        let entry = CacheEntry::decode(&raw);
        if entry.is_none() {
            tracing::warn!(key, "discarding malformed cache entry");
        }
        Ok(entry)
    }
}

impl<S> Clone for CacheService<S>
where
    S: CacheStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: Arc::clone(&self.policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CacheKey;
    use crate::memory::{InMemoryCacheStore, InMemoryStoreConfig};
    use crate::traits::KeyListPage;
    use async_trait::async_trait;
    use statline_core::{
        CanonicalPlayerId, EntityIdType, RepositoryError, SeasonId, ServiceError, StatField,
        StatlineError,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const MINUTE: i64 = 60_000;

    // Store wrapper that records the provider TTL of every put
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryCacheStore,
        puts: Mutex<Vec<(String, u64)>>,
    }

    #[async_trait]
    impl CacheStore for RecordingStore {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: String, ttl_seconds: u64) -> CacheResult<()> {
            self.puts.lock().unwrap().push((key.to_string(), ttl_seconds));
            self.inner.put(key, value, ttl_seconds).await
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.inner.delete(key).await
        }

        async fn list(&self, prefix: &str, cursor: Option<&str>) -> CacheResult<KeyListPage> {
            self.inner.list(prefix, cursor).await
        }
    }

    // Store whose backend is unreachable
    struct UnavailableStore;

    #[async_trait]
    impl CacheStore for UnavailableStore {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Read {
                key: key.to_string(),
                reason: "connection refused".to_string(),
            })
        }

        async fn put(&self, key: &str, _value: String, _ttl_seconds: u64) -> CacheResult<()> {
            Err(CacheError::Write {
                key: key.to_string(),
                reason: "connection refused".to_string(),
            })
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            Err(CacheError::Delete {
                key: key.to_string(),
                reason: "connection refused".to_string(),
            })
        }

        async fn list(&self, prefix: &str, _cursor: Option<&str>) -> CacheResult<KeyListPage> {
            Err(CacheError::List {
                prefix: prefix.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    fn memory_cache() -> CacheService<InMemoryCacheStore> {
        CacheService::with_defaults(Arc::new(InMemoryCacheStore::new()))
    }

    fn player_key() -> String {
        CacheKey::player_stats(CanonicalPlayerId::new(7), Some(SeasonId::new(2024))).into_string()
    }

    async fn write_raw(cache: &CacheService<InMemoryCacheStore>, key: &str, value: i64, metadata: CacheMetadata) {
        let blob = CacheEntry::new(value, metadata).encode().unwrap();
        cache.store().put(key, blob, 86_400).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_then_get_is_fresh() {
        let cache = memory_cache();
        let key = player_key();

        cache.set(&key, &vec![1, 2, 3], SetOptions::default()).await.unwrap();
        let read = cache.get::<Vec<i32>>(&key).await.unwrap();

        assert_eq!(read.value(), Some(&vec![1, 2, 3]));
        assert!(!read.is_stale());
        assert!(!read.needs_revalidation());
    }

    #[tokio::test]
    async fn test_get_missing_key_is_miss() {
        let cache = memory_cache();
        let read = cache.get::<i64>("identity:404").await.unwrap();
        assert!(read.is_miss());
        assert!(!read.is_stale());
        assert!(!read.needs_revalidation());
    }

    #[tokio::test]
    async fn test_get_stale_entry_serves_value() {
        let cache = memory_cache();
        let key = player_key();
        let now = now_millis();
        write_raw(
            &cache,
            &key,
            99,
            CacheMetadata {
                stored_at: now - 50 * MINUTE,
                stale_at: now - 2 * MINUTE,
                expires_at: now + 22 * MINUTE,
            },
        )
        .await;

        let read = cache.get::<i64>(&key).await.unwrap();
        assert_eq!(read.value(), Some(&99));
        assert!(read.is_stale());
        assert!(read.needs_revalidation());
    }

    #[tokio::test]
    async fn test_get_expired_entry_is_miss_before_store_eviction() {
        let cache = memory_cache();
        let key = player_key();
        let now = now_millis();
        write_raw(
            &cache,
            &key,
            99,
            CacheMetadata {
                stored_at: now - 70 * MINUTE,
                stale_at: now - 58 * MINUTE,
                expires_at: now - 48 * MINUTE,
            },
        )
        .await;

        // The store still holds the blob
        assert!(cache.store().get(&key).await.unwrap().is_some());

        let read = cache.get::<i64>(&key).await.unwrap();
        assert!(read.is_miss());
        assert!(!read.is_stale());
        assert!(!read.needs_revalidation());
    }

    #[tokio::test]
    async fn test_get_at_uses_supplied_clock() {
        let cache = memory_cache();
        let key = player_key();
        let metadata = cache.set(&key, &5i64, SetOptions::default()).await.unwrap();

        let fresh = cache.get_at::<i64>(&key, metadata.stale_at).await.unwrap();
        assert!(fresh.is_hit() && !fresh.is_stale());

        let stale = cache.get_at::<i64>(&key, metadata.stale_at + 1).await.unwrap();
        assert!(stale.is_stale());

        let gone = cache.get_at::<i64>(&key, metadata.expires_at + 1).await.unwrap();
        assert!(gone.is_miss());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss_not_error() {
        let cache = memory_cache();
        let key = player_key();
        cache.store().put(&key, "{\"oops\":true}".to_string(), 60).await.unwrap();

        let read = cache.get::<i64>(&key).await.unwrap();
        assert!(read.is_miss());
    }

    #[tokio::test]
    async fn test_set_writes_metadata_and_provider_ttl() {
        let store = Arc::new(RecordingStore::default());
        let cache = CacheService::with_defaults(Arc::clone(&store));
        let key = player_key();

        let metadata = cache.set(&key, &1i64, SetOptions::default()).await.unwrap();
        assert_eq!(metadata.ttl_millis(), 3_600_000);
        assert_eq!(metadata.stale_at - metadata.stored_at, 2_880_000);
        assert!(metadata.stored_at <= metadata.stale_at && metadata.stale_at <= metadata.expires_at);

        let puts = store.puts.lock().unwrap().clone();
        assert_eq!(puts, vec![(key, 4320)]);
    }

    #[tokio::test]
    async fn test_set_off_season_and_override() {
        let store = Arc::new(RecordingStore::default());
        let cache = CacheService::with_defaults(Arc::clone(&store));
        let key = player_key();

        let off_season = cache
            .set(&key, &1i64, SetOptions::new().with_active_season(false))
            .await
            .unwrap();
        assert_eq!(off_season.ttl_millis(), 86_400_000);

        let board = CacheKey::leaderboard(&[], StatField::Points, None);
        let overridden = cache
            .set(board.as_str(), &1i64, SetOptions::new().with_ttl(45))
            .await
            .unwrap();
        assert_eq!(overridden.ttl_millis(), 45_000);

        let puts = store.puts.lock().unwrap().clone();
        assert_eq!(puts[0].1, 103_680);
        assert_eq!(puts[1].1, 54);
    }

    #[tokio::test]
    async fn test_set_rejects_zero_ttl_override() {
        let store = Arc::new(RecordingStore::default());
        let cache = CacheService::with_defaults(Arc::clone(&store));
        let board = CacheKey::leaderboard(&[], StatField::Points, None);

        let result = cache.set(board.as_str(), &1i64, SetOptions::new().with_ttl(0)).await;

        assert!(matches!(result, Err(CacheError::Write { ref key, .. }) if key == board.as_str()));
        assert!(store.puts.lock().unwrap().is_empty());
        assert!(store.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_with_huge_ttl_override_does_not_overflow() {
        let store = Arc::new(RecordingStore::default());
        let cache = CacheService::with_defaults(Arc::clone(&store));
        let board = CacheKey::leaderboard(&[], StatField::Points, None);

        let metadata = cache
            .set(board.as_str(), &1i64, SetOptions::new().with_ttl(u64::MAX))
            .await
            .unwrap();

        assert!(metadata.stored_at <= metadata.stale_at);
        assert!(metadata.stale_at <= metadata.expires_at);
        let puts = store.puts.lock().unwrap().clone();
        assert_eq!(puts, vec![(board.clone().into_string(), u64::MAX)]);

        let read = cache.get::<i64>(board.as_str()).await.unwrap();
        assert_eq!(read.value(), Some(&1));
    }

    #[tokio::test]
    async fn test_get_or_set_does_not_compute_on_fresh_hit() {
        let cache = memory_cache();
        let key = player_key();
        cache.set(&key, &10i64, SetOptions::default()).await.unwrap();

        let computed = AtomicBool::new(false);
        let value: i64 = cache
            .get_or_set(
                &key,
                || async {
                    computed.store(true, Ordering::SeqCst);
                    Ok::<_, CacheError>(20)
                },
                SetOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(value, 10);
        assert!(!computed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_get_or_set_does_not_compute_on_stale_hit() {
        let cache = memory_cache();
        let key = player_key();
        let now = now_millis();
        write_raw(
            &cache,
            &key,
            10,
            CacheMetadata {
                stored_at: now - 50 * MINUTE,
                stale_at: now - 2 * MINUTE,
                expires_at: now + 22 * MINUTE,
            },
        )
        .await;

        let computed = AtomicBool::new(false);
        let value: i64 = cache
            .get_or_set(
                &key,
                || async {
                    computed.store(true, Ordering::SeqCst);
                    Ok::<_, CacheError>(20)
                },
                SetOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(value, 10);
        assert!(!computed.load(Ordering::SeqCst));

        // Still stale afterwards: nothing refreshed it
        let read = cache.get::<i64>(&key).await.unwrap();
        assert!(read.is_stale());
    }

    #[tokio::test]
    async fn test_get_or_set_computes_once_on_miss() {
        let cache = memory_cache();
        let key = player_key();
        let calls = AtomicUsize::new(0);

        let value: i64 = cache
            .get_or_set(
                &key,
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(33)
                },
                SetOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(value, 33);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let read = cache.get::<i64>(&key).await.unwrap();
        assert_eq!(read.value(), Some(&33));
        assert!(!read.is_stale());
    }

    #[tokio::test]
    async fn test_get_or_set_recomputes_expired_entry() {
        let cache = memory_cache();
        let key = player_key();
        let now = now_millis();
        write_raw(
            &cache,
            &key,
            10,
            CacheMetadata {
                stored_at: now - 70 * MINUTE,
                stale_at: now - 58 * MINUTE,
                expires_at: now - 48 * MINUTE,
            },
        )
        .await;

        let value: i64 = cache
            .get_or_set(&key, || async { Ok::<_, CacheError>(20) }, SetOptions::default())
            .await
            .unwrap();
        assert_eq!(value, 20);
        assert_eq!(cache.get::<i64>(&key).await.unwrap().value(), Some(&20));
    }

    #[tokio::test]
    async fn test_get_or_set_propagates_compute_error_unchanged() {
        let cache = memory_cache();
        let key = player_key();

        let result: Result<i64, StatlineError> = cache
            .get_or_set(
                &key,
                || async {
                    Err(StatlineError::Service(ServiceError::new(
                        "failed to resolve canonical player 7",
                        RepositoryError::database("timeout"),
                    )))
                },
                SetOptions::default(),
            )
            .await;

        match result {
            Err(StatlineError::Service(err)) => {
                assert_eq!(err.cause, RepositoryError::database("timeout"));
            }
            other => panic!("expected service error, got {other:?}"),
        }
        assert!(cache.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_cache_error() {
        let cache = CacheService::with_defaults(Arc::new(UnavailableStore));

        assert!(matches!(cache.get::<i64>("identity:1").await, Err(CacheError::Read { .. })));
        assert!(matches!(
            cache.set("identity:1", &1i64, SetOptions::default()).await,
            Err(CacheError::Write { .. })
        ));
        assert!(matches!(cache.invalidate("identity:1").await, Err(CacheError::Delete { .. })));
        assert!(matches!(cache.invalidate_by_prefix("identity:").await, Err(CacheError::List { .. })));

        let result: Result<i64, StatlineError> = cache
            .get_or_set("identity:1", || async { Ok(1) }, SetOptions::default())
            .await;
        assert!(matches!(result, Err(StatlineError::Cache(CacheError::Read { .. }))));
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let cache = memory_cache();
        let key = player_key();
        cache.set(&key, &1i64, SetOptions::default()).await.unwrap();

        cache.invalidate(&key).await.unwrap();
        cache.invalidate(&key).await.unwrap();
        assert!(cache.get::<i64>(&key).await.unwrap().is_miss());
    }

    #[tokio::test]
    async fn test_invalidate_by_prefix_follows_pages() {
        let store = InMemoryCacheStore::with_config(InMemoryStoreConfig::default().with_list_page_size(2));
        let cache = CacheService::with_defaults(Arc::new(store));
        let player = CanonicalPlayerId::new(3);

        for season in 1..=5 {
            let key = CacheKey::player_stats(player, Some(SeasonId::new(season)));
            cache.set(key.as_str(), &season, SetOptions::default()).await.unwrap();
        }
        let other = CacheKey::player_stats(CanonicalPlayerId::new(31), None);
        cache.set(other.as_str(), &0i64, SetOptions::default()).await.unwrap();

        let deleted = cache
            .invalidate_by_prefix(&CacheKey::player_stats_prefix(player))
            .await
            .unwrap();

        assert_eq!(deleted, 5);
        assert_eq!(cache.store().len().await, 1);
        assert!(cache.get::<i64>(other.as_str()).await.unwrap().is_hit());
    }

    #[test]
    fn test_try_new_rejects_invalid_policy() {
        let policy = TtlPolicy::default().with_stale_window_ratio(1.0);
        let result = CacheService::try_new(Arc::new(InMemoryCacheStore::new()), Arc::new(policy));
        assert!(result.is_err());
    }
}
