//! Aggregation service configuration.

use statline_core::ConfigError;

/// Runtime settings of [`crate::AggregationService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationConfig {
    /// Picks the in-season player stats TTL when true.
    pub is_active_season: bool,
    /// Explicit TTL for cached leaderboards, in seconds.
    pub leaderboard_ttl_secs: u64,
    /// Records fetched per source player when comparing players.
    pub comparison_record_limit: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            is_active_season: true,
            leaderboard_ttl_secs: 300,
            comparison_record_limit: 1000,
        }
    }
}

impl AggregationConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// - `STATLINE_ACTIVE_SEASON`: `false`/`0` selects off-season TTLs (default: true)
    /// - `STATLINE_LEADERBOARD_TTL_SECS` (default: 300)
    /// - `STATLINE_COMPARISON_RECORD_LIMIT` (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let is_active_season = std::env::var("STATLINE_ACTIVE_SEASON")
            .ok()
            .map(|s| {
                let s = s.trim().to_lowercase();
                s != "false" && s != "0"
            })
            .unwrap_or(defaults.is_active_season);

        let leaderboard_ttl_secs = std::env::var("STATLINE_LEADERBOARD_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.leaderboard_ttl_secs);

        let comparison_record_limit = std::env::var("STATLINE_COMPARISON_RECORD_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.comparison_record_limit);

        Self {
            is_active_season,
            leaderboard_ttl_secs,
            comparison_record_limit,
        }
    }

    pub fn with_active_season(mut self, is_active_season: bool) -> Self {
        self.is_active_season = is_active_season;
        self
    }

    pub fn with_leaderboard_ttl_secs(mut self, secs: u64) -> Self {
        self.leaderboard_ttl_secs = secs;
        self
    }

    pub fn with_comparison_record_limit(mut self, limit: u32) -> Self {
        self.comparison_record_limit = limit;
        self
    }

    /// Rejects a zero leaderboard TTL or comparison limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leaderboard_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "leaderboard_ttl_secs".to_string(),
                value: "0".to_string(),
                reason: "leaderboard_ttl_secs must be greater than 0".to_string(),
            });
        }
        if self.comparison_record_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "comparison_record_limit".to_string(),
                value: "0".to_string(),
                reason: "comparison_record_limit must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.as_deref() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_from_env_reads_overrides() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _season = EnvVarGuard::set("STATLINE_ACTIVE_SEASON", Some("False"));
        let _ttl = EnvVarGuard::set("STATLINE_LEADERBOARD_TTL_SECS", Some("90"));
        let _limit = EnvVarGuard::set("STATLINE_COMPARISON_RECORD_LIMIT", Some("50"));

        let config = AggregationConfig::from_env();
        assert!(!config.is_active_season);
        assert_eq!(config.leaderboard_ttl_secs, 90);
        assert_eq!(config.comparison_record_limit, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_defaults_and_unparsable_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _season = EnvVarGuard::set("STATLINE_ACTIVE_SEASON", None);
        let _ttl = EnvVarGuard::set("STATLINE_LEADERBOARD_TTL_SECS", Some("five minutes"));
        let _limit = EnvVarGuard::set("STATLINE_COMPARISON_RECORD_LIMIT", Some("-1"));

        assert_eq!(AggregationConfig::from_env(), AggregationConfig::default());
    }

    #[test]
    fn test_from_env_active_season_spellings() {
        let _lock = ENV_MUTEX.lock().unwrap();
        for (raw, expected) in [("0", false), (" false ", false), ("true", true), ("1", true)] {
            let _season = EnvVarGuard::set("STATLINE_ACTIVE_SEASON", Some(raw));
            assert_eq!(AggregationConfig::from_env().is_active_season, expected, "value {raw:?}");
        }
    }

    #[test]
    fn test_from_env_zero_ttl_fails_validation() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _ttl = EnvVarGuard::set("STATLINE_LEADERBOARD_TTL_SECS", Some("0"));

        let config = AggregationConfig::from_env();
        assert_eq!(config.leaderboard_ttl_secs, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = AggregationConfig::default();
        assert!(config.is_active_season);
        assert_eq!(config.leaderboard_ttl_secs, 300);
        assert_eq!(config.comparison_record_limit, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = AggregationConfig::default().with_leaderboard_ttl_secs(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "leaderboard_ttl_secs"
        ));

        let config = AggregationConfig::default().with_comparison_record_limit(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "comparison_record_limit"
        ));
    }

    #[test]
    fn test_builders() {
        let config = AggregationConfig::default()
            .with_active_season(false)
            .with_leaderboard_ttl_secs(60)
            .with_comparison_record_limit(25);
        assert!(!config.is_active_season);
        assert_eq!(config.leaderboard_ttl_secs, 60);
        assert_eq!(config.comparison_record_limit, 25);
    }
}
