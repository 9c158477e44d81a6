//! Cache entry metadata and freshness classification.
//!
//! Staleness is decided from the metadata stored next to each value, not from
//! the store's own TTL. The store TTL only reclaims space; it is written long
//! enough that an entry stays readable through its whole stale window.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use statline_core::EpochMillis;

/// Timestamps written with every cached value.
///
/// Invariant: `stored_at <= stale_at <= expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub stored_at: EpochMillis,
    pub expires_at: EpochMillis,
    pub stale_at: EpochMillis,
}

impl CacheMetadata {
    /// Build metadata for a write at `stored_at` with the given TTL and
    /// stale window (both already resolved by the policy).
    pub fn new(stored_at: EpochMillis, ttl_secs: u64, stale_window_ms: i64) -> Self {
        let ttl_ms = i64::try_from(ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        let expires_at = stored_at.saturating_add(ttl_ms);
        let stale_at = expires_at
            .saturating_sub(stale_window_ms.clamp(0, ttl_ms))
            .max(stored_at);

        Self {
            stored_at,
            expires_at,
            stale_at,
        }
    }

    /// Classify this entry as of `now`.
    pub fn freshness_at(&self, now: EpochMillis) -> Freshness {
        if now > self.expires_at {
            Freshness::Expired
        } else if now > self.stale_at {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }

    /// Logical lifetime, `expires_at - stored_at`.
    pub fn ttl_millis(&self) -> i64 {
        self.expires_at - self.stored_at
    }
}

/// Where an entry sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// `now <= stale_at`: serve as is.
    Fresh,
    /// `stale_at < now <= expires_at`: serve, but it should be refreshed.
    Stale,
    /// `now > expires_at`: a miss, even if the store still holds it.
    Expired,
}

/// The persisted form of a cached value.
///
/// Wire format: `{"value": ..., "metadata": {"storedAt", "expiresAt", "staleAt"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub metadata: CacheMetadata,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, metadata: CacheMetadata) -> Self {
        Self { value, metadata }
    }
}

impl<T: Serialize> CacheEntry<T> {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned> CacheEntry<T> {
    /// Decode a stored blob.
    ///
    /// Returns `None` when the blob is not JSON, lacks a `value` field, lacks a
    /// numeric `metadata.storedAt`, or does not match `T`. Callers treat all
    /// of these as a cache miss.
    pub fn decode(raw: &str) -> Option<Self> {
        let json: serde_json::Value = serde_json::from_str(raw).ok()?;

        let has_value = json.get("value").is_some();
        let has_stored_at = json
            .get("metadata")
            .and_then(|metadata| metadata.get("storedAt"))
            .is_some_and(serde_json::Value::is_number);
        if !has_value || !has_stored_at {
            return None;
        }

        serde_json::from_value(json).ok()
    }
}

/// Result of a cache read, carrying staleness flags.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: Option<T>,
    is_stale: bool,
    needs_revalidation: bool,
}

impl<T> CacheRead<T> {
    /// Nothing usable was cached.
    pub fn miss() -> Self {
        Self {
            value: None,
            is_stale: false,
            needs_revalidation: false,
        }
    }

    pub fn fresh(value: T) -> Self {
        Self {
            value: Some(value),
            is_stale: false,
            needs_revalidation: false,
        }
    }

    /// A value inside its stale window. Still served; flagged for refresh.
    pub fn stale(value: T) -> Self {
        Self {
            value: Some(value),
            is_stale: true,
            needs_revalidation: true,
        }
    }

    pub(crate) fn from_entry(entry: CacheEntry<T>, now: EpochMillis) -> Self {
        match entry.metadata.freshness_at(now) {
            Freshness::Fresh => Self::fresh(entry.value),
            Freshness::Stale => Self::stale(entry.value),
            Freshness::Expired => Self::miss(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn is_hit(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_miss(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    pub fn needs_revalidation(&self) -> bool {
        self.needs_revalidation
    }

    /// Map the inner value to a new type.
    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: self.value.map(f),
            is_stale: self.is_stale,
            needs_revalidation: self.needs_revalidation,
        }
    }
}
