//! Cross-league aggregation service.
//!
//! Reads go through the cache first. On a miss the service resolves the
//! canonical player, fans out one repository call per linked source player
//! (or per league for leaderboards) and combines the results. Repository
//! failures are wrapped in a [`ServiceError`] naming the failed step; cache
//! failures pass through as [`StatlineError::Cache`].

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join_all;
use statline_cache::{CacheKey, CacheService, CacheStore, SetOptions, LEADERBOARD_PREFIX};
use statline_core::{
    CanonicalPlayer, CanonicalPlayerId, ConfigError, LeaderboardEntry, LeaderboardRow, LeagueId,
    PlayerComparison, PlayerComparisonEntry, PlayerStatsForCanonical, RepositoryError, SeasonId,
    ServiceError, SourcePlayerLink, SourceStats, StatField, StatlineError, StatlineResult,
};

use crate::aggregate::{aggregate_sources, group_by_league, sort_by_priority};
use crate::config::AggregationConfig;
use crate::leaderboard::{merge_and_rank, rank_rows};
use crate::repository::{
    CanonicalPlayerQuery, LeaderboardQuery, PlayerStatsQuery, PlayersRepository,
    SeasonStatsQuery, StatsRepository,
};

/// Parameters of a leaderboard read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRequest {
    pub season_id: Option<SeasonId>,
    /// Empty ranks across every league.
    pub league_ids: Vec<LeagueId>,
    pub stat_type: Option<String>,
    pub sort_by: StatField,
    pub limit: u32,
    pub cursor: Option<String>,
}

impl Default for LeaderboardRequest {
    fn default() -> Self {
        Self {
            season_id: None,
            league_ids: Vec::new(),
            stat_type: None,
            sort_by: StatField::default(),
            limit: 25,
            cursor: None,
        }
    }
}

impl LeaderboardRequest {
    /// Request the top `limit` rows across every league, sorted by points.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn with_season(mut self, season_id: SeasonId) -> Self {
        self.season_id = Some(season_id);
        self
    }

    pub fn with_leagues(mut self, league_ids: impl IntoIterator<Item = LeagueId>) -> Self {
        self.league_ids = league_ids.into_iter().collect();
        self
    }

    pub fn with_sort_by(mut self, sort_by: StatField) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_stat_type(mut self, stat_type: impl Into<String>) -> Self {
        self.stat_type = Some(stat_type.into());
        self
    }
}

/// How many records to pull per source player, and from where.
#[derive(Debug, Clone, Copy)]
struct FetchWindow<'a> {
    season_id: Option<SeasonId>,
    limit: u32,
    cursor: Option<&'a str>,
}

/// Cached cross-league reads over a stats and a players repository.
pub struct AggregationService<S, R, P>
where
    S: CacheStore,
    R: StatsRepository,
    P: PlayersRepository,
{
    cache: CacheService<S>,
    stats: Arc<R>,
    players: Arc<P>,
    config: AggregationConfig,
}

impl<S, R, P> AggregationService<S, R, P>
where
    S: CacheStore,
    R: StatsRepository,
    P: PlayersRepository,
{
    /// Create a new aggregation service. The config is taken as is.
    pub fn new(cache: CacheService<S>, stats: Arc<R>, players: Arc<P>, config: AggregationConfig) -> Self {
        Self {
            cache,
            stats,
            players,
            config,
        }
    }

    /// Create a new aggregation service, rejecting an invalid config.
    pub fn try_new(
        cache: CacheService<S>,
        stats: Arc<R>,
        players: Arc<P>,
        config: AggregationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(cache, stats, players, config))
    }

    /// Get a reference to the underlying cache service.
    pub fn cache(&self) -> &CacheService<S> {
        &self.cache
    }

    /// Get a reference to the service configuration.
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Every league's records for one canonical player plus their totals.
    ///
    /// Cached under `stats:player:{id}:season:{s}` or `stats:player:{id}:all`
    /// with the player stats TTL for the configured season state. `limit` and
    /// `cursor` apply per source player and are not part of the key.
    pub async fn get_player_stats(
        &self,
        canonical_player_id: CanonicalPlayerId,
        season_id: Option<SeasonId>,
        limit: u32,
        cursor: Option<&str>,
    ) -> StatlineResult<PlayerStatsForCanonical> {
        let key = CacheKey::player_stats(canonical_player_id, season_id);
        let options = SetOptions::new().with_active_season(self.config.is_active_season);
        let window = FetchWindow {
            season_id,
            limit,
            cursor,
        };

        self.cache
            .get_or_set(
                key.as_str(),
                || self.compute_player_stats(canonical_player_id, window),
                options,
            )
            .await
    }

    /// Ranked leaderboard, possibly spanning several leagues.
    ///
    /// With two or more leagues, each league's top `limit` rows are fetched,
    /// merged, re-sorted by `sort_by` and only then truncated. Cached under
    /// the leaderboard key with the configured leaderboard TTL.
    pub async fn get_leaderboard(&self, request: &LeaderboardRequest) -> StatlineResult<Vec<LeaderboardEntry>> {
        let key = CacheKey::leaderboard(&request.league_ids, request.sort_by, request.season_id);
        let options = SetOptions::new().with_ttl(self.config.leaderboard_ttl_secs);

        self.cache
            .get_or_set(key.as_str(), || self.compute_leaderboard(request), options)
            .await
    }

    /// Side-by-side totals for several canonical players. Never cached.
    ///
    /// Duplicate IDs are compared once, in first-seen order.
    pub async fn compare_player_stats(
        &self,
        canonical_player_ids: &[CanonicalPlayerId],
        season_id: Option<SeasonId>,
    ) -> StatlineResult<PlayerComparison> {
        let mut seen = HashSet::new();
        let unique: Vec<CanonicalPlayerId> = canonical_player_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let window = FetchWindow {
            season_id,
            limit: self.config.comparison_record_limit,
            cursor: None,
        };
        let players = try_join_all(unique.into_iter().map(|id| self.compare_one(id, window))).await?;

        tracing::debug!(players = players.len(), ?season_id, "compared player stats");
        Ok(PlayerComparison {
            season_id,
            players,
        })
    }

    /// Drop every cached season view of one player. Returns the number of keys removed.
    pub async fn invalidate_player_stats(&self, canonical_player_id: CanonicalPlayerId) -> StatlineResult<u64> {
        let prefix = CacheKey::player_stats_prefix(canonical_player_id);
        Ok(self.cache.invalidate_by_prefix(&prefix).await?)
    }

    /// Drop every cached leaderboard. Returns the number of keys removed.
    pub async fn invalidate_leaderboards(&self) -> StatlineResult<u64> {
        Ok(self.cache.invalidate_by_prefix(LEADERBOARD_PREFIX).await?)
    }

    async fn compute_player_stats(
        &self,
        canonical_player_id: CanonicalPlayerId,
        window: FetchWindow<'_>,
    ) -> StatlineResult<PlayerStatsForCanonical> {
        let player = self.resolve_player(canonical_player_id).await?;
        let stats_by_source = self.fetch_sources(&player, window).await?;
        let aggregated_totals = aggregate_sources(&stats_by_source);

        tracing::debug!(
            %canonical_player_id,
            sources = stats_by_source.len(),
            games = aggregated_totals.games_played,
            "computed player stats"
        );

        Ok(PlayerStatsForCanonical {
            canonical_player_id: player.canonical_player_id,
            display_name: player.display_name,
            stats_by_source,
            aggregated_totals,
        })
    }

    async fn compute_leaderboard(&self, request: &LeaderboardRequest) -> StatlineResult<Vec<LeaderboardEntry>> {
        let mut league_ids = request.league_ids.clone();
        league_ids.sort_unstable();
        league_ids.dedup();

        let limit = request.limit as usize;
        let entries = match league_ids.as_slice() {
            [] => rank_rows(self.fetch_leaderboard_page(request, None).await?, limit),
            [league_id] => rank_rows(
                self.fetch_leaderboard_page(request, Some(*league_id)).await?,
                limit,
            ),
            many => {
                let pages = try_join_all(
                    many.iter()
                        .map(|league_id| self.fetch_leaderboard_page(request, Some(*league_id))),
                )
                .await?;
                merge_and_rank(pages, request.sort_by, limit)
            }
        };

        tracing::debug!(
            leagues = league_ids.len(),
            sort_by = %request.sort_by,
            entries = entries.len(),
            "computed leaderboard"
        );
        Ok(entries)
    }

    async fn compare_one(
        &self,
        canonical_player_id: CanonicalPlayerId,
        window: FetchWindow<'_>,
    ) -> StatlineResult<PlayerComparisonEntry> {
        let player = self.resolve_player(canonical_player_id).await?;
        let sources = self.fetch_sources(&player, window).await?;

        Ok(PlayerComparisonEntry {
            canonical_player_id: player.canonical_player_id,
            display_name: player.display_name,
            totals: aggregate_sources(&sources),
            stats_by_league: group_by_league(&sources),
        })
    }

    async fn resolve_player(&self, canonical_player_id: CanonicalPlayerId) -> StatlineResult<CanonicalPlayer> {
        let query = CanonicalPlayerQuery {
            canonical_player_id,
        };
        self.players
            .get_canonical_player(&query)
            .await
            .map_err(|e| service_error(format!("failed to resolve canonical player {canonical_player_id}"), e))
    }

    /// Fetch every linked source concurrently, then order by league priority.
    async fn fetch_sources(&self, player: &CanonicalPlayer, window: FetchWindow<'_>) -> StatlineResult<Vec<SourceStats>> {
        let mut sources = try_join_all(
            player
                .source_players
                .iter()
                .map(|link| self.fetch_source_stats(link, window)),
        )
        .await?;
        sort_by_priority(&mut sources);
        Ok(sources)
    }

    async fn fetch_source_stats(&self, link: &SourcePlayerLink, window: FetchWindow<'_>) -> StatlineResult<SourceStats> {
        let source_player_id = link.source_player_id;
        let cursor = window.cursor.map(str::to_string);

        let result = match window.season_id {
            Some(season_id) => {
                let query = SeasonStatsQuery {
                    source_player_id,
                    season_id,
                    limit: window.limit,
                    cursor,
                };
                self.stats.get_player_stats_by_season(&query).await
            }
            None => {
                let query = PlayerStatsQuery {
                    source_player_id,
                    limit: window.limit,
                    cursor,
                };
                self.stats.get_player_stats(&query).await
            }
        };

        let stats = result
            .map_err(|e| service_error(format!("failed to fetch stats for source player {source_player_id}"), e))?;

        Ok(SourceStats {
            source_player_id,
            league_id: link.league_id,
            league_abbreviation: link.league_abbreviation.clone(),
            league_priority: link.league_priority,
            stats,
        })
    }

    async fn fetch_leaderboard_page(
        &self,
        request: &LeaderboardRequest,
        league_id: Option<LeagueId>,
    ) -> StatlineResult<Vec<LeaderboardRow>> {
        let query = LeaderboardQuery {
            season_id: request.season_id,
            league_id,
            stat_type: request.stat_type.clone(),
            sort_by: request.sort_by,
            limit: request.limit,
            cursor: request.cursor.clone(),
        };

        self.stats.get_leaderboard(&query).await.map_err(|e| {
            let message = match league_id {
                Some(league_id) => format!("failed to fetch leaderboard for league {league_id}"),
                None => "failed to fetch leaderboard".to_string(),
            };
            service_error(message, e)
        })
    }
}

fn service_error(message: String, cause: RepositoryError) -> StatlineError {
    tracing::warn!(error = %cause, "{message}");
    ServiceError::new(message, cause).into()
}
