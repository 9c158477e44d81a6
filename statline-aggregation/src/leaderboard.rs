//! Combining per-league leaderboard pages into one ranked list.

use statline_core::{LeaderboardEntry, LeaderboardRow, StatField};

/// Assign contiguous 1-based ranks in iteration order, stopping at `limit`.
pub fn rank_rows<I>(rows: I, limit: usize) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = LeaderboardRow>,
{
    rows.into_iter()
        .take(limit)
        .zip(1u32..)
        .map(|(row, rank)| LeaderboardEntry { rank, row })
        .collect()
}

/// Merge per-league pages, re-sort them and keep the best `limit` rows.
///
/// Each page is already a league's top candidates. Pages are concatenated in
/// the order given and sorted descending by `sort_by`. The sort is stable, so
/// tied rows keep page order. Truncation happens only after the merge, so one
/// league may fill the whole board.
pub fn merge_and_rank(
    pages: Vec<Vec<LeaderboardRow>>,
    sort_by: StatField,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<LeaderboardRow> = pages.into_iter().flatten().collect();
    rows.sort_by(|a, b| {
        sort_by
            .value_of_totals(&b.stats)
            .cmp(&sort_by.value_of_totals(&a.stats))
    });
    rank_rows(rows, limit)
}
