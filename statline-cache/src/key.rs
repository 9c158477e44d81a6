//! Canonical cache keys for every cached query shape.
//!
//! Keys are plain strings so any string-keyed store can hold them, but they
//! can only be built through the constructors below. Equal query parameters
//! always produce byte-identical keys: list parameters are sorted and
//! de-duplicated before joining, so the order a caller passes them in never
//! produces a second, un-invalidatable entry.
//!
//! # Format
//!
//! | type | key |
//! | --- | --- |
//! | player stats | `stats:player:{id}:season:{seasonId}` or `stats:player:{id}:all` |
//! | team totals | `stats:team:{id}[:season:{seasonId}]:totals` |
//! | game | `stats:game:{id}` |
//! | identity | `identity:{id}` |
//! | leaderboard | `leaderboard:{leagueIds joined by ','}:{sortBy}:{season:{seasonId}\|all}` |

use statline_core::{CanonicalPlayerId, GameId, LeagueId, SeasonId, StatField, TeamId};
use std::fmt;

pub const PLAYER_STATS_PREFIX: &str = "stats:player:";
pub const TEAM_TOTALS_PREFIX: &str = "stats:team:";
pub const GAME_PREFIX: &str = "stats:game:";
pub const IDENTITY_PREFIX: &str = "identity:";
pub const LEADERBOARD_PREFIX: &str = "leaderboard:";

/// The kind of query a key caches, recovered from the key's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKeyType {
    PlayerStats,
    TeamTotals,
    Game,
    Identity,
    Leaderboard,
    Unknown,
}

impl CacheKeyType {
    /// Infer the key type from a raw key string.
    ///
    /// Every string maps to exactly one type; anything without a known
    /// prefix is `Unknown`.
    pub fn from_key(key: &str) -> Self {
        const PREFIXES: [(&str, CacheKeyType); 5] = [
            (PLAYER_STATS_PREFIX, CacheKeyType::PlayerStats),
            (TEAM_TOTALS_PREFIX, CacheKeyType::TeamTotals),
            (GAME_PREFIX, CacheKeyType::Game),
            (IDENTITY_PREFIX, CacheKeyType::Identity),
            (LEADERBOARD_PREFIX, CacheKeyType::Leaderboard),
        ];

        PREFIXES
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix))
            .map(|(_, key_type)| *key_type)
            .unwrap_or(CacheKeyType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKeyType::PlayerStats => "playerStats",
            CacheKeyType::TeamTotals => "teamTotals",
            CacheKeyType::Game => "game",
            CacheKeyType::Identity => "identity",
            CacheKeyType::Leaderboard => "leaderboard",
            CacheKeyType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CacheKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// `stats:player:{id}:season:{seasonId}` or `stats:player:{id}:all`.
    pub fn player_stats(player_id: CanonicalPlayerId, season_id: Option<SeasonId>) -> Self {
        let scope = match season_id {
            Some(season_id) => format!("season:{season_id}"),
            None => "all".to_string(),
        };
        Self(format!("{PLAYER_STATS_PREFIX}{player_id}:{scope}"))
    }

    /// `stats:team:{id}[:season:{seasonId}]:totals`.
    pub fn team_totals(team_id: TeamId, season_id: Option<SeasonId>) -> Self {
        match season_id {
            Some(season_id) => Self(format!(
                "{TEAM_TOTALS_PREFIX}{team_id}:season:{season_id}:totals"
            )),
            None => Self(format!("{TEAM_TOTALS_PREFIX}{team_id}:totals")),
        }
    }

    pub fn game(game_id: GameId) -> Self {
        Self(format!("{GAME_PREFIX}{game_id}"))
    }

    pub fn identity(player_id: CanonicalPlayerId) -> Self {
        Self(format!("{IDENTITY_PREFIX}{player_id}"))
    }

    /// `leaderboard:{sorted league ids}:{sortBy}:{season:{seasonId}|all}`.
    ///
    /// An empty league list means "all leagues" and leaves the segment empty.
    pub fn leaderboard(
        league_ids: &[LeagueId],
        sort_by: StatField,
        season_id: Option<SeasonId>,
    ) -> Self {
        let mut ids = league_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let leagues = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let season = match season_id {
            Some(season_id) => format!("season:{season_id}"),
            None => "all".to_string(),
        };

        Self(format!("{LEADERBOARD_PREFIX}{leagues}:{sort_by}:{season}"))
    }

    /// Prefix covering every cached season view of one canonical player.
    ///
    /// Ends with `:` so player `1` never matches player `12`.
    pub fn player_stats_prefix(player_id: CanonicalPlayerId) -> String {
        format!("{PLAYER_STATS_PREFIX}{player_id}:")
    }

    /// Prefix covering every cached totals view of one team.
    pub fn team_totals_prefix(team_id: TeamId) -> String {
        format!("{TEAM_TOTALS_PREFIX}{team_id}:")
    }

    pub fn key_type(&self) -> CacheKeyType {
        CacheKeyType::from_key(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
