//! Boundary traits for the relational repositories the aggregation layer reads.
//!
//! Both repositories live outside this workspace. They are injected into
//! [`crate::AggregationService`] behind `Arc`s so tests can swap in fakes.

use async_trait::async_trait;
use statline_core::{
    CanonicalPlayer, CanonicalPlayerId, LeaderboardRow, LeagueId, PlayerStatRecord,
    RepositoryError, SeasonId, SourcePlayerId, StatField,
};

/// Result type alias for repository calls.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Every record of one source player, paginated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatsQuery {
    pub source_player_id: SourcePlayerId,
    pub limit: u32,
    pub cursor: Option<String>,
}

/// Records of one source player within a season, paginated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonStatsQuery {
    pub source_player_id: SourcePlayerId,
    pub season_id: SeasonId,
    pub limit: u32,
    pub cursor: Option<String>,
}

/// One leaderboard page.
///
/// The repository filters by season and league, orders rows descending by
/// `sort_by` and returns at most `limit` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardQuery {
    pub season_id: Option<SeasonId>,
    /// `None` ranks across every league at once.
    pub league_id: Option<LeagueId>,
    /// Opaque stat category filter, passed through untouched.
    pub stat_type: Option<String>,
    pub sort_by: StatField,
    pub limit: u32,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalPlayerQuery {
    pub canonical_player_id: CanonicalPlayerId,
}

/// Read access to raw per-league stat rows.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn get_player_stats(&self, query: &PlayerStatsQuery) -> RepositoryResult<Vec<PlayerStatRecord>>;

    async fn get_player_stats_by_season(
        &self,
        query: &SeasonStatsQuery,
    ) -> RepositoryResult<Vec<PlayerStatRecord>>;

    async fn get_leaderboard(&self, query: &LeaderboardQuery) -> RepositoryResult<Vec<LeaderboardRow>>;
}

/// Read access to identity-resolved players.
#[async_trait]
pub trait PlayersRepository: Send + Sync {
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    async fn get_canonical_player(&self, query: &CanonicalPlayerQuery) -> RepositoryResult<CanonicalPlayer>;
}
