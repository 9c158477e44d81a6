//! Summing raw stat records into derived totals.
//!
//! Raw rows from different leagues are never merged into one row. They only
//! meet inside an [`AggregatedStats`] total, and [`group_by_league`] keeps a
//! separate subtotal per league.

use statline_core::{AggregatedStats, LeagueStats, PlayerStatRecord, SourceStats};

/// Sum every record. `games_played` counts the records.
pub fn aggregate_records<'a, I>(records: I) -> AggregatedStats
where
    I: IntoIterator<Item = &'a PlayerStatRecord>,
{
    records
        .into_iter()
        .fold(AggregatedStats::default(), |mut totals, record| {
            totals.add_game(&record.line);
            totals
        })
}

/// Sum the records of every source bundle together.
pub fn aggregate_sources(sources: &[SourceStats]) -> AggregatedStats {
    aggregate_records(sources.iter().flat_map(|source| &source.stats))
}

/// Order source bundles by ascending league priority.
///
/// The sort is stable, so bundles with equal priority keep their fetch order.
pub fn sort_by_priority(sources: &mut [SourceStats]) {
    sources.sort_by_key(|source| source.league_priority);
}

/// One subtotal per league abbreviation, ordered by league priority.
///
/// Two source players in the same league share one entry. A league's
/// priority is taken from the first bundle seen for it.
pub fn group_by_league(sources: &[SourceStats]) -> Vec<LeagueStats> {
    let mut leagues: Vec<LeagueStats> = Vec::new();

    for source in sources {
        let subtotal = aggregate_records(&source.stats);
        match leagues
            .iter_mut()
            .find(|league| league.league_abbreviation == source.league_abbreviation)
        {
            Some(league) => league.stats += subtotal,
            None => leagues.push(LeagueStats {
                league_id: source.league_id,
                league_abbreviation: source.league_abbreviation.clone(),
                league_priority: source.league_priority,
                stats: subtotal,
            }),
        }
    }

    leagues.sort_by_key(|league| league.league_priority);
    leagues
}
