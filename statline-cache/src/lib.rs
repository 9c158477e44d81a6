//! Statline Cache - read-through caching over a string KV store
//!
//! Values are written as JSON envelopes carrying their own freshness
//! metadata. Reads classify an entry as fresh, stale or expired from that
//! metadata alone:
//!
//! - fresh entries are served as is
//! - stale entries are still served, flagged with `needs_revalidation`
//! - expired entries are a miss, even while the store still holds the blob
//!
//! The store receives a TTL 20% longer than the logical one so that stale
//! entries remain readable until their metadata says they are gone.
//!
//! # Example
//!
//! ```ignore
//! let cache = CacheService::new(store, Arc::new(TtlPolicy::from_env()));
//!
//! let read = cache.get::<PlayerStatsForCanonical>(key.as_str()).await?;
//! if read.needs_revalidation() {
//!     tracing::debug!("serving stale player stats");
//! }
//! ```

pub mod freshness;
pub mod key;
pub mod memory;
pub mod policy;
pub mod service;
pub mod traits;

pub use freshness::{CacheEntry, CacheMetadata, CacheRead, Freshness};
pub use key::{
    CacheKey, CacheKeyType, GAME_PREFIX, IDENTITY_PREFIX, LEADERBOARD_PREFIX, PLAYER_STATS_PREFIX,
    TEAM_TOTALS_PREFIX,
};
pub use memory::{InMemoryCacheStore, InMemoryStoreConfig};
pub use policy::{TtlPolicy, DEFAULT_STALE_WINDOW_RATIO};
pub use service::{CacheService, SetOptions};
pub use traits::{CacheResult, CacheStore, KeyInfo, KeyListPage};
