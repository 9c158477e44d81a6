//! TTL policy for cached queries.
//!
//! The policy is an immutable value built once at startup and shared with the
//! cache service behind an `Arc`.

use statline_core::ConfigError;
use std::str::FromStr;

use crate::key::CacheKeyType;

/// Fraction of a TTL during which an entry is served stale.
pub const DEFAULT_STALE_WINDOW_RATIO: f64 = 0.20;

/// Base TTLs (seconds) per key type plus the global stale-window ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlPolicy {
    /// Player stats while the season is running.
    pub player_stats_active_secs: u64,
    /// Player stats in the off-season.
    pub player_stats_offseason_secs: u64,
    /// Team and league totals. Leaderboards share this value.
    pub team_totals_secs: u64,
    pub game_secs: u64,
    pub identity_secs: u64,
    /// Keys whose type cannot be inferred.
    pub default_secs: u64,
    pub stale_window_ratio: f64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            player_stats_active_secs: 3600,    // 1 hour
            player_stats_offseason_secs: 86400, // 24 hours
            team_totals_secs: 300,             // 5 minutes
            game_secs: 86400,                  // 24 hours
            identity_secs: 604800,             // 7 days
            default_secs: 3600,
            stale_window_ratio: DEFAULT_STALE_WINDOW_RATIO,
        }
    }
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `STATLINE_TTL_PLAYER_STATS_ACTIVE` (default: 3600)
    /// - `STATLINE_TTL_PLAYER_STATS_OFFSEASON` (default: 86400)
    /// - `STATLINE_TTL_TEAM_TOTALS` (default: 300)
    /// - `STATLINE_TTL_GAME` (default: 86400)
    /// - `STATLINE_TTL_IDENTITY` (default: 604800)
    /// - `STATLINE_TTL_DEFAULT` (default: 3600)
    /// - `STATLINE_STALE_WINDOW_RATIO` (default: 0.2)
    ///
    /// The result is not validated; call [`TtlPolicy::validate`].
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            player_stats_active_secs: env_or(
                "STATLINE_TTL_PLAYER_STATS_ACTIVE",
                defaults.player_stats_active_secs,
            ),
            player_stats_offseason_secs: env_or(
                "STATLINE_TTL_PLAYER_STATS_OFFSEASON",
                defaults.player_stats_offseason_secs,
            ),
            team_totals_secs: env_or("STATLINE_TTL_TEAM_TOTALS", defaults.team_totals_secs),
            game_secs: env_or("STATLINE_TTL_GAME", defaults.game_secs),
            identity_secs: env_or("STATLINE_TTL_IDENTITY", defaults.identity_secs),
            default_secs: env_or("STATLINE_TTL_DEFAULT", defaults.default_secs),
            stale_window_ratio: env_or("STATLINE_STALE_WINDOW_RATIO", defaults.stale_window_ratio),
        }
    }

    /// Set the stale-window ratio.
    pub fn with_stale_window_ratio(mut self, ratio: f64) -> Self {
        self.stale_window_ratio = ratio;
        self
    }

    /// Set the team totals (and leaderboard) TTL.
    pub fn with_team_totals_secs(mut self, secs: u64) -> Self {
        self.team_totals_secs = secs;
        self
    }

    /// Validates:
    /// - every TTL is greater than zero
    /// - stale_window_ratio is strictly between 0 and 1
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ttls = [
            ("player_stats_active_secs", self.player_stats_active_secs),
            ("player_stats_offseason_secs", self.player_stats_offseason_secs),
            ("team_totals_secs", self.team_totals_secs),
            ("game_secs", self.game_secs),
            ("identity_secs", self.identity_secs),
            ("default_secs", self.default_secs),
        ];
        for (field, value) in ttls {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: format!("{field} must be greater than 0"),
                });
            }
        }

        let ratio = self.stale_window_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "stale_window_ratio".to_string(),
                value: ratio.to_string(),
                reason: "stale_window_ratio must be between 0.0 and 1.0 (exclusive)".to_string(),
            });
        }

        Ok(())
    }

    /// Base TTL for a key type.
    pub fn ttl_for(&self, key_type: CacheKeyType, is_active_season: bool) -> u64 {
        match key_type {
            CacheKeyType::PlayerStats if is_active_season => self.player_stats_active_secs,
            CacheKeyType::PlayerStats => self.player_stats_offseason_secs,
            CacheKeyType::TeamTotals | CacheKeyType::Leaderboard => self.team_totals_secs,
            CacheKeyType::Game => self.game_secs,
            CacheKeyType::Identity => self.identity_secs,
            CacheKeyType::Unknown => self.default_secs,
        }
    }

    /// Base TTL for a raw key, inferring its type from the prefix.
    pub fn ttl_for_key(&self, key: &str, is_active_season: bool) -> u64 {
        self.ttl_for(CacheKeyType::from_key(key), is_active_season)
    }

    /// Length of the stale window for a TTL, rounded to whole milliseconds.
    pub fn stale_window_millis(&self, ttl_secs: u64) -> i64 {
        (ttl_secs as f64 * 1000.0 * self.stale_window_ratio).round() as i64
    }

    /// TTL handed to the store: `ceil(ttl × (1 + ratio))`, saturating at `u64::MAX`.
    ///
    /// It outlives the logical expiry so entry metadata, not the store,
    /// decides whether a value is fresh, stale or gone.
    pub fn provider_ttl_secs(&self, ttl_secs: u64) -> u64 {
        let window_ms = self.stale_window_millis(ttl_secs).max(0) as u64;
        ttl_secs.saturating_add(window_ms.div_ceil(1000))
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
