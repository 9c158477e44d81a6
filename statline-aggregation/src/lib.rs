//! Statline Aggregation - cross-league stats over the read-through cache
//!
//! A canonical player links to one source player per league. This crate
//! resolves those links, fetches each league's raw records and combines them
//! under one rule: rows from different leagues are never merged into a single
//! row. They only meet inside derived totals.
//!
//! - [`AggregationService::get_player_stats`]: per-league records plus totals, cached
//! - [`AggregationService::get_leaderboard`]: merged multi-league leaderboard, cached
//! - [`AggregationService::compare_player_stats`]: per-league subtotals for several players, uncached

pub mod aggregate;
pub mod config;
pub mod leaderboard;
pub mod repository;
pub mod service;
pub mod telemetry;

pub use aggregate::{aggregate_records, aggregate_sources, group_by_league, sort_by_priority};
pub use config::AggregationConfig;
pub use leaderboard::{merge_and_rank, rank_rows};
pub use repository::{
    CanonicalPlayerQuery, LeaderboardQuery, PlayerStatsQuery, PlayersRepository,
    RepositoryResult, SeasonStatsQuery, StatsRepository,
};
pub use service::{AggregationService, LeaderboardRequest};
pub use telemetry::{init_tracing, TelemetryConfig};
