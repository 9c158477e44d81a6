//! Statline Test Utilities
//!
//! Centralized test infrastructure for the Statline workspace:
//! - In-memory fakes for the stats and players repositories
//! - A cache store that always fails
//! - Proptest generators for IDs, stat lines and records
//! - Test fixtures for common multi-league scenarios
//! - Custom assertions for Statline error kinds

pub use statline_core::{
    AggregatedStats, CacheError, CanonicalPlayer, CanonicalPlayerId, ConfigError, EntityIdType,
    EntityType, GameId, LeaderboardEntry, LeaderboardRow, LeagueId, PlayerStatRecord,
    RepositoryError, SeasonId, SourcePlayerId, SourcePlayerLink, StatField, StatLine,
    StatRecordId, StatlineError, StatlineResult,
};

use async_trait::async_trait;
use statline_aggregation::{
    CanonicalPlayerQuery, LeaderboardQuery, PlayerStatsQuery, PlayersRepository,
    RepositoryResult, SeasonStatsQuery, StatsRepository,
};
use statline_cache::{CacheResult, CacheStore, KeyListPage};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

// ============================================================================
// FAKE REPOSITORIES
// ============================================================================

/// In-memory stats repository with call counters and failure injection.
///
/// Cursors are decimal offsets into the matching rows.
#[derive(Debug, Default)]
pub struct InMemoryStatsRepository {
    records: RwLock<HashMap<SourcePlayerId, Vec<PlayerStatRecord>>>,
    leaderboard: RwLock<Vec<LeaderboardRow>>,
    failing_sources: RwLock<HashSet<SourcePlayerId>>,
    failing_leagues: RwLock<HashSet<LeagueId>>,
    leaderboard_queries: RwLock<Vec<LeaderboardQuery>>,
    player_stats_calls: AtomicUsize,
    season_stats_calls: AtomicUsize,
    leaderboard_calls: AtomicUsize,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records, grouped by their source player.
    pub fn with_records(self, records: impl IntoIterator<Item = PlayerStatRecord>) -> Self {
        {
            let mut stored = self.records.write().unwrap();
            for record in records {
                stored.entry(record.source_player_id).or_default().push(record);
            }
        }
        self
    }

    pub fn with_leaderboard_rows(self, rows: impl IntoIterator<Item = LeaderboardRow>) -> Self {
        self.leaderboard.write().unwrap().extend(rows);
        self
    }

    /// Make every stats call for this source player fail with a database error.
    pub fn fail_source(&self, source_player_id: SourcePlayerId) {
        self.failing_sources.write().unwrap().insert(source_player_id);
    }

    /// Make leaderboard calls scoped to this league fail with a database error.
    pub fn fail_league(&self, league_id: LeagueId) {
        self.failing_leagues.write().unwrap().insert(league_id);
    }

    pub fn player_stats_calls(&self) -> usize {
        self.player_stats_calls.load(Ordering::SeqCst)
    }

    pub fn season_stats_calls(&self) -> usize {
        self.season_stats_calls.load(Ordering::SeqCst)
    }

    pub fn leaderboard_calls(&self) -> usize {
        self.leaderboard_calls.load(Ordering::SeqCst)
    }

    /// Total stats calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.player_stats_calls() + self.season_stats_calls() + self.leaderboard_calls()
    }

    /// Every leaderboard query received, in call order.
    pub fn leaderboard_queries(&self) -> Vec<LeaderboardQuery> {
        self.leaderboard_queries.read().unwrap().clone()
    }

    fn check_source(&self, source_player_id: SourcePlayerId) -> RepositoryResult<()> {
        if self.failing_sources.read().unwrap().contains(&source_player_id) {
            return Err(RepositoryError::database(format!(
                "stats query failed for source player {source_player_id}"
            )));
        }
        Ok(())
    }

    fn page<T: Clone>(rows: Vec<T>, limit: u32, cursor: Option<&str>) -> Vec<T> {
        let offset = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        rows.into_iter().skip(offset).take(limit as usize).collect()
    }

    fn records_for(&self, source_player_id: SourcePlayerId) -> Vec<PlayerStatRecord> {
        self.records
            .read()
            .unwrap()
            .get(&source_player_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn get_player_stats(&self, query: &PlayerStatsQuery) -> RepositoryResult<Vec<PlayerStatRecord>> {
        self.player_stats_calls.fetch_add(1, Ordering::SeqCst);
        self.check_source(query.source_player_id)?;

        let rows = self.records_for(query.source_player_id);
        Ok(Self::page(rows, query.limit, query.cursor.as_deref()))
    }

    async fn get_player_stats_by_season(
        &self,
        query: &SeasonStatsQuery,
    ) -> RepositoryResult<Vec<PlayerStatRecord>> {
        self.season_stats_calls.fetch_add(1, Ordering::SeqCst);
        self.check_source(query.source_player_id)?;

        let rows = self
            .records_for(query.source_player_id)
            .into_iter()
            .filter(|record| record.season_id == Some(query.season_id))
            .collect();
        Ok(Self::page(rows, query.limit, query.cursor.as_deref()))
    }

    async fn get_leaderboard(&self, query: &LeaderboardQuery) -> RepositoryResult<Vec<LeaderboardRow>> {
        self.leaderboard_calls.fetch_add(1, Ordering::SeqCst);
        self.leaderboard_queries.write().unwrap().push(query.clone());

        if let Some(league_id) = query.league_id {
            if self.failing_leagues.read().unwrap().contains(&league_id) {
                return Err(RepositoryError::database(format!(
                    "leaderboard query failed for league {league_id}"
                )));
            }
        }

        let mut rows: Vec<LeaderboardRow> = self
            .leaderboard
            .read()
            .unwrap()
            .iter()
            .filter(|row| query.season_id.is_none() || row.season_id == query.season_id)
            .filter(|row| query.league_id.map_or(true, |league_id| row.league_id == league_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            query
                .sort_by
                .value_of_totals(&b.stats)
                .cmp(&query.sort_by.value_of_totals(&a.stats))
        });

        Ok(Self::page(rows, query.limit, query.cursor.as_deref()))
    }
}

/// In-memory players repository with a call counter and failure injection.
#[derive(Debug, Default)]
pub struct InMemoryPlayersRepository {
    players: RwLock<HashMap<CanonicalPlayerId, CanonicalPlayer>>,
    failing: RwLock<HashSet<CanonicalPlayerId>>,
    calls: AtomicUsize,
}

impl InMemoryPlayersRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(self, players: impl IntoIterator<Item = CanonicalPlayer>) -> Self {
        {
            let mut stored = self.players.write().unwrap();
            for player in players {
                stored.insert(player.canonical_player_id, player);
            }
        }
        self
    }

    /// Make lookups of this player fail with a database error.
    pub fn fail_player(&self, canonical_player_id: CanonicalPlayerId) {
        self.failing.write().unwrap().insert(canonical_player_id);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlayersRepository for InMemoryPlayersRepository {
    async fn get_canonical_player(&self, query: &CanonicalPlayerQuery) -> RepositoryResult<CanonicalPlayer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = query.canonical_player_id;

        if self.failing.read().unwrap().contains(&id) {
            return Err(RepositoryError::database(format!("identity lookup failed for {id}")));
        }

        self.players
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(EntityType::CanonicalPlayer, id.as_i64()))
    }
}

// ============================================================================
// FAILING CACHE STORE
// ============================================================================

/// Cache store whose backend is unreachable. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCacheStore;

#[async_trait]
impl CacheStore for UnavailableCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Read {
            key: key.to_string(),
            reason: "store unavailable".to_string(),
        })
    }

    async fn put(&self, key: &str, _value: String, _ttl_seconds: u64) -> CacheResult<()> {
        Err(CacheError::Write {
            key: key.to_string(),
            reason: "store unavailable".to_string(),
        })
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        Err(CacheError::Delete {
            key: key.to_string(),
            reason: "store unavailable".to_string(),
        })
    }

    async fn list(&self, prefix: &str, _cursor: Option<&str>) -> CacheResult<KeyListPage> {
        Err(CacheError::List {
            prefix: prefix.to_string(),
            reason: "store unavailable".to_string(),
        })
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Statline types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_league_id() -> impl Strategy<Value = LeagueId> {
        (1i64..50).prop_map(LeagueId::new)
    }

    /// A possibly empty league list, duplicates allowed.
    pub fn arb_league_ids() -> impl Strategy<Value = Vec<LeagueId>> {
        prop::collection::vec(arb_league_id(), 0..6)
    }

    pub fn arb_season_id() -> impl Strategy<Value = SeasonId> {
        (2000i64..2040).prop_map(SeasonId::new)
    }

    pub fn arb_stat_field() -> impl Strategy<Value = StatField> {
        prop::sample::select(StatField::ALL.to_vec())
    }

    /// A plausible single-game stat line. Points equal goals plus assists.
    pub fn arb_stat_line() -> impl Strategy<Value = StatLine> {
        (0i64..8, 0i64..8, 0i64..15, 0i64..6, 0i64..5, 0i64..30, 0i64..30).prop_map(
            |(goals, assists, ground_balls, turnovers, caused_turnovers, faceoff_wins, faceoff_losses)| {
                StatLine {
                    goals,
                    assists,
                    points: goals + assists,
                    ground_balls,
                    turnovers,
                    caused_turnovers,
                    faceoff_wins,
                    faceoff_losses,
                }
            },
        )
    }

    pub fn arb_stat_record() -> impl Strategy<Value = PlayerStatRecord> {
        (
            1i64..1_000_000,
            1i64..10_000,
            proptest::option::of(1i64..100_000),
            proptest::option::of(arb_season_id()),
            arb_league_id(),
            arb_stat_line(),
        )
            .prop_map(|(id, source, game, season_id, league_id, line)| PlayerStatRecord {
                id: StatRecordId::new(id),
                source_player_id: SourcePlayerId::new(source),
                game_id: game.map(GameId::new),
                season_id,
                league_id,
                line,
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use statline_aggregation::{AggregationConfig, AggregationService};
    use statline_cache::{CacheService, InMemoryCacheStore, TtlPolicy};
    use std::sync::Arc;

    /// Service over an in-memory cache with the default policy and config.
    pub type TestAggregationService =
        AggregationService<InMemoryCacheStore, InMemoryStatsRepository, InMemoryPlayersRepository>;

    /// One game with the given goals and assists; points are their sum.
    pub fn stat_record(
        id: i64,
        source_player_id: i64,
        league_id: i64,
        season_id: Option<i64>,
        goals: i64,
        assists: i64,
    ) -> PlayerStatRecord {
        PlayerStatRecord {
            id: StatRecordId::new(id),
            source_player_id: SourcePlayerId::new(source_player_id),
            game_id: Some(GameId::new(id)),
            season_id: season_id.map(SeasonId::new),
            league_id: LeagueId::new(league_id),
            line: StatLine {
                goals,
                assists,
                points: goals + assists,
                ..Default::default()
            },
        }
    }

    pub fn source_link(source_player_id: i64, league_id: i64, abbreviation: &str, priority: i32) -> SourcePlayerLink {
        SourcePlayerLink {
            source_player_id: SourcePlayerId::new(source_player_id),
            league_id: LeagueId::new(league_id),
            league_abbreviation: abbreviation.to_string(),
            league_priority: priority,
        }
    }

    pub fn canonical_player(id: i64, display_name: &str, source_players: Vec<SourcePlayerLink>) -> CanonicalPlayer {
        CanonicalPlayer {
            canonical_player_id: CanonicalPlayerId::new(id),
            display_name: display_name.to_string(),
            source_players,
        }
    }

    /// A leaderboard candidate whose only non-zero stat is `points`.
    pub fn leaderboard_row(source_player_id: i64, league_id: i64, abbreviation: &str, points: i64) -> LeaderboardRow {
        LeaderboardRow {
            source_player_id: SourcePlayerId::new(source_player_id),
            player_name: format!("Player {source_player_id}"),
            league_id: LeagueId::new(league_id),
            league_abbreviation: abbreviation.to_string(),
            season_id: None,
            stats: AggregatedStats {
                points,
                games_played: 1,
                ..Default::default()
            },
        }
    }

    /// Canonical player 1 ("Two League Player") with source 11 in PLL
    /// (league 1, priority 1) and source 12 in NLL (league 2, priority 2).
    ///
    /// Records: PLL has 2 games in season 2024 (3g 1a, 2g 2a); NLL has one
    /// game in 2024 (4g 0a) and one in 2023 (1g 1a).
    pub fn two_league_player() -> (CanonicalPlayer, Vec<PlayerStatRecord>) {
        let player = canonical_player(
            1,
            "Two League Player",
            // NLL listed first so priority ordering is observable
            vec![source_link(12, 2, "NLL", 2), source_link(11, 1, "PLL", 1)],
        );
        let records = vec![
            stat_record(101, 11, 1, Some(2024), 3, 1),
            stat_record(102, 11, 1, Some(2024), 2, 2),
            stat_record(201, 12, 2, Some(2024), 4, 0),
            stat_record(202, 12, 2, Some(2023), 1, 1),
        ];
        (player, records)
    }

    /// Build a service over fresh in-memory cache storage.
    pub fn test_service(
        stats: Arc<InMemoryStatsRepository>,
        players: Arc<InMemoryPlayersRepository>,
    ) -> TestAggregationService {
        test_service_with_config(stats, players, AggregationConfig::default())
    }

    pub fn test_service_with_config(
        stats: Arc<InMemoryStatsRepository>,
        players: Arc<InMemoryPlayersRepository>,
        config: AggregationConfig,
    ) -> TestAggregationService {
        let cache = CacheService::new(Arc::new(InMemoryCacheStore::new()), Arc::new(TtlPolicy::default()));
        AggregationService::new(cache, stats, players, config)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for Statline-specific validation.

    use super::*;

    /// Assert that a StatlineResult is a Service error with this message and cause.
    #[track_caller]
    pub fn assert_service_error<T: std::fmt::Debug>(
        result: &StatlineResult<T>,
        expected_message: &str,
        expected_cause: &RepositoryError,
    ) {
        match result {
            Err(StatlineError::Service(err)) => {
                assert_eq!(err.message, expected_message, "Wrong service error message");
                assert_eq!(&err.cause, expected_cause, "Wrong service error cause");
            }
            other => panic!("Expected Service error, got: {:?}", other),
        }
    }

    /// Assert that a StatlineResult is a Cache error.
    #[track_caller]
    pub fn assert_cache_error<T: std::fmt::Debug>(result: &StatlineResult<T>) {
        match result {
            Err(StatlineError::Cache(_)) => {}
            other => panic!("Expected Cache error, got: {:?}", other),
        }
    }

    /// Assert that ranks run 1..=n in order.
    #[track_caller]
    pub fn assert_ranks_contiguous(entries: &[LeaderboardEntry]) {
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.rank as usize, i + 1, "Rank gap at position {}", i);
        }
    }

    /// Assert that entries are ordered descending by `field`.
    #[track_caller]
    pub fn assert_sorted_desc(entries: &[LeaderboardEntry], field: StatField) {
        for pair in entries.windows(2) {
            let (a, b) = (
                field.value_of_totals(&pair[0].row.stats),
                field.value_of_totals(&pair[1].row.stats),
            );
            assert!(a >= b, "Leaderboard not sorted by {}: {} before {}", field, a, b);
        }
    }
}
