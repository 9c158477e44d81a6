//! Identity types for Statline entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Milliseconds since the Unix epoch. Cache metadata is stored at this resolution.
pub type EpochMillis = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}

/// Entity type discriminator, used by not-found errors and ID types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    CanonicalPlayer,
    SourcePlayer,
    League,
    Season,
    Team,
    Game,
    StatRecord,
}

/// Common behaviour of the strongly-typed integer IDs.
pub trait EntityIdType: Copy + Eq + Ord + fmt::Display {
    /// The entity this ID identifies.
    const ENTITY_TYPE: EntityType;

    fn new(raw: i64) -> Self;

    fn as_i64(&self) -> i64;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident => $entity:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl EntityIdType for $name {
            const ENTITY_TYPE: EntityType = EntityType::$entity;

            fn new(raw: i64) -> Self {
                Self(raw)
            }

            fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }
    };
}

define_entity_id!(
    /// Identity-resolved player spanning one or more leagues.
    CanonicalPlayerId => CanonicalPlayer
);
define_entity_id!(
    /// A player row as it exists inside a single league.
    SourcePlayerId => SourcePlayer
);
define_entity_id!(LeagueId => League);
define_entity_id!(SeasonId => Season);
define_entity_id!(TeamId => Team);
define_entity_id!(GameId => Game);
define_entity_id!(StatRecordId => StatRecord);
