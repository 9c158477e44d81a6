//! Cache store adapter trait.
//!
//! The store is an opaque string blob store with provider-side TTLs, e.g. a
//! hosted KV namespace, Redis, or the in-memory store in this crate. The cache
//! service assumes nothing beyond key-level TTL expiry and prefix listing.

use async_trait::async_trait;
use statline_core::{CacheError, EpochMillis};

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// One key returned by [`CacheStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub name: String,
    /// Provider-side expiry, when the store reports one.
    pub expiration: Option<EpochMillis>,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyListPage {
    pub keys: Vec<KeyInfo>,
    /// `false` when more keys remain; pass `cursor` to fetch them.
    pub is_complete: bool,
    pub cursor: Option<String>,
}

/// Store adapter trait for pluggable key-value backends.
///
/// Implementations should be thread-safe and support concurrent access.
/// Every failure is reported as a [`CacheError`]; an absent key is `Ok(None)`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the raw blob stored under `key`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous blob.
    ///
    /// The store may drop the key once `ttl_seconds` have elapsed.
    async fn put(&self, key: &str, value: String, ttl_seconds: u64) -> CacheResult<()>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// List keys starting with `prefix`, one page at a time.
    async fn list(&self, prefix: &str, cursor: Option<&str>) -> CacheResult<KeyListPage>;
}
