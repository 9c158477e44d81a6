//! Stat lines, aggregated totals and the sortable stat fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use crate::error::ValidationError;

/// Raw per-game counting stats as a league reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLine {
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub ground_balls: i64,
    pub turnovers: i64,
    pub caused_turnovers: i64,
    pub faceoff_wins: i64,
    pub faceoff_losses: i64,
}

/// Derived totals over any number of stat lines.
///
/// Never persisted as a row of its own. It is recomputed from raw records on
/// every uncached read and only ever cached inside a larger response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub games_played: i64,
    pub ground_balls: i64,
    pub turnovers: i64,
    pub caused_turnovers: i64,
    pub faceoff_wins: i64,
    pub faceoff_losses: i64,
}

impl AggregatedStats {
    /// Fold one game's stat line into the totals.
    pub fn add_game(&mut self, line: &StatLine) {
        self.goals += line.goals;
        self.assists += line.assists;
        self.points += line.points;
        self.ground_balls += line.ground_balls;
        self.turnovers += line.turnovers;
        self.caused_turnovers += line.caused_turnovers;
        self.faceoff_wins += line.faceoff_wins;
        self.faceoff_losses += line.faceoff_losses;
        self.games_played += 1;
    }
}

impl AddAssign for AggregatedStats {
    fn add_assign(&mut self, rhs: Self) {
        self.goals += rhs.goals;
        self.assists += rhs.assists;
        self.points += rhs.points;
        self.games_played += rhs.games_played;
        self.ground_balls += rhs.ground_balls;
        self.turnovers += rhs.turnovers;
        self.caused_turnovers += rhs.caused_turnovers;
        self.faceoff_wins += rhs.faceoff_wins;
        self.faceoff_losses += rhs.faceoff_losses;
    }
}

/// A stat a leaderboard can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatField {
    Goals,
    Assists,
    #[default]
    Points,
    GamesPlayed,
    GroundBalls,
    Turnovers,
    CausedTurnovers,
    FaceoffWins,
    FaceoffLosses,
}

impl StatField {
    pub const ALL: [StatField; 9] = [
        StatField::Goals,
        StatField::Assists,
        StatField::Points,
        StatField::GamesPlayed,
        StatField::GroundBalls,
        StatField::Turnovers,
        StatField::CausedTurnovers,
        StatField::FaceoffWins,
        StatField::FaceoffLosses,
    ];

    /// Canonical spelling, as used in cache keys and repository queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatField::Goals => "goals",
            StatField::Assists => "assists",
            StatField::Points => "points",
            StatField::GamesPlayed => "gamesPlayed",
            StatField::GroundBalls => "groundBalls",
            StatField::Turnovers => "turnovers",
            StatField::CausedTurnovers => "causedTurnovers",
            StatField::FaceoffWins => "faceoffWins",
            StatField::FaceoffLosses => "faceoffLosses",
        }
    }

    /// Read this field from aggregated totals.
    pub fn value_of_totals(&self, totals: &AggregatedStats) -> i64 {
        match self {
            StatField::Goals => totals.goals,
            StatField::Assists => totals.assists,
            StatField::Points => totals.points,
            StatField::GamesPlayed => totals.games_played,
            StatField::GroundBalls => totals.ground_balls,
            StatField::Turnovers => totals.turnovers,
            StatField::CausedTurnovers => totals.caused_turnovers,
            StatField::FaceoffWins => totals.faceoff_wins,
            StatField::FaceoffLosses => totals.faceoff_losses,
        }
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "goals" => Ok(StatField::Goals),
            "assists" => Ok(StatField::Assists),
            "points" => Ok(StatField::Points),
            "gamesPlayed" | "games_played" => Ok(StatField::GamesPlayed),
            "groundBalls" | "ground_balls" => Ok(StatField::GroundBalls),
            "turnovers" => Ok(StatField::Turnovers),
            "causedTurnovers" | "caused_turnovers" => Ok(StatField::CausedTurnovers),
            "faceoffWins" | "faceoff_wins" => Ok(StatField::FaceoffWins),
            "faceoffLosses" | "faceoff_losses" => Ok(StatField::FaceoffLosses),
            other => Err(ValidationError::UnknownStatField {
                name: other.to_string(),
            }),
        }
    }
}
