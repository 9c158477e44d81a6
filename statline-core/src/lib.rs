//! Statline Core - Entity Types
//!
//! Pure data structures shared by the cache and aggregation crates: typed IDs,
//! canonical players, raw stat rows, aggregated views and the error taxonomy.
//! This crate contains no I/O.

pub mod entities;
pub mod error;
pub mod identity;
pub mod stats;

pub use entities::{
    CanonicalPlayer, LeaderboardEntry, LeaderboardRow, LeagueStats, PlayerComparison,
    PlayerComparisonEntry, PlayerStatRecord, PlayerStatsForCanonical, SourcePlayerLink,
    SourceStats,
};
pub use error::{
    CacheError, ConfigError, RepositoryError, ServiceError, StatlineError, StatlineResult,
    ValidationError,
};
pub use identity::{
    now_millis, CanonicalPlayerId, EntityIdType, EntityType, EpochMillis, GameId, LeagueId,
    SeasonId, SourcePlayerId, StatRecordId, TeamId, Timestamp,
};
pub use stats::{AggregatedStats, StatField, StatLine};
