//! Entity and response types shared by the cache and aggregation layers.

use serde::{Deserialize, Serialize};

use crate::identity::{
    CanonicalPlayerId, GameId, LeagueId, SeasonId, SourcePlayerId, StatRecordId,
};
use crate::stats::{AggregatedStats, StatLine};

// ============================================================================
// IDENTITY RESOLUTION
// ============================================================================

/// Link from a canonical player to one of its per-league source players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePlayerLink {
    pub source_player_id: SourcePlayerId,
    pub league_id: LeagueId,
    pub league_abbreviation: String,
    /// Lower value wins any tie-break between leagues.
    pub league_priority: i32,
}

/// A player identity that spans one or more leagues.
///
/// Owned by the players repository; the aggregation layer only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPlayer {
    pub canonical_player_id: CanonicalPlayerId,
    pub display_name: String,
    pub source_players: Vec<SourcePlayerLink>,
}

// ============================================================================
// RAW REPOSITORY ROWS
// ============================================================================

/// One game appearance of a source player, as stored by its league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatRecord {
    pub id: StatRecordId,
    pub source_player_id: SourcePlayerId,
    pub game_id: Option<GameId>,
    pub season_id: Option<SeasonId>,
    pub league_id: LeagueId,
    #[serde(flatten)]
    pub line: StatLine,
}

/// Leaderboard candidate as returned by the stats repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub source_player_id: SourcePlayerId,
    pub player_name: String,
    pub league_id: LeagueId,
    pub league_abbreviation: String,
    pub season_id: Option<SeasonId>,
    pub stats: AggregatedStats,
}

// ============================================================================
// AGGREGATED VIEWS
// ============================================================================

/// Raw records of one source player, tagged with the league they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    pub source_player_id: SourcePlayerId,
    pub league_id: LeagueId,
    pub league_abbreviation: String,
    pub league_priority: i32,
    pub stats: Vec<PlayerStatRecord>,
}

/// Every league's records for one canonical player plus their combined totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsForCanonical {
    pub canonical_player_id: CanonicalPlayerId,
    pub display_name: String,
    /// Ordered by ascending league priority.
    pub stats_by_source: Vec<SourceStats>,
    pub aggregated_totals: AggregatedStats,
}

/// Subtotal of a single league. Never mixes rows from different leagues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueStats {
    pub league_id: LeagueId,
    pub league_abbreviation: String,
    pub league_priority: i32,
    pub stats: AggregatedStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerComparisonEntry {
    pub canonical_player_id: CanonicalPlayerId,
    pub display_name: String,
    /// Cross-league sum, kept separate from the per-league breakdown.
    pub totals: AggregatedStats,
    pub stats_by_league: Vec<LeagueStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerComparison {
    pub season_id: Option<SeasonId>,
    pub players: Vec<PlayerComparisonEntry>,
}

/// A ranked leaderboard row. Ranks are 1-based and contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    #[serde(flatten)]
    pub row: LeaderboardRow,
}
