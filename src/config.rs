//! Configuration Module
//!
//! Handles the options a cache is constructed with, loadable from
//! environment variables or any serde source.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::MAX_TTL_SECONDS;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default TTL in seconds for entries set without an explicit TTL
    /// (`None` or `Some(0)` = entries never expire by default)
    pub default_ttl: Option<u64>,
    /// Emit a debug event for every cache operation
    pub debug: bool,
}

impl Config {
    /// Creates a new Config with no default TTL and debug tracing off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: none, `0` = none)
    /// - `CACHE_DEBUG` - Enables operation tracing (`1`, `true`, `yes`, `on`)
    pub fn from_env() -> Self {
        Self {
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .filter(|ttl| *ttl > 0),
            debug: env::var("CACHE_DEBUG")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Sets the default TTL in seconds.
    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = Some(seconds);
        self
    }

    /// Enables or disables per-operation debug tracing.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Default TTL as a duration, `None` when entries should not expire.
    pub(crate) fn default_ttl_duration(&self) -> Option<Duration> {
        self.default_ttl.and_then(ttl_duration)
    }
}

/// Converts a TTL in seconds to a duration, capped at `MAX_TTL_SECONDS`.
///
/// `0` means no expiry.
pub(crate) fn ttl_duration(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds.min(MAX_TTL_SECONDS)))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, None);
        assert!(!config.debug);
        assert_eq!(config.default_ttl_duration(), None);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new().with_default_ttl(30).with_debug(true);
        assert_eq!(config.default_ttl, Some(30));
        assert!(config.debug);
        assert_eq!(config.default_ttl_duration(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_default_ttl_means_no_expiry() {
        let config = Config::new().with_default_ttl(0);
        assert_eq!(config.default_ttl_duration(), None);
    }

    #[test]
    fn test_extreme_ttl_is_capped() {
        let capped = Some(Duration::from_secs(MAX_TTL_SECONDS));
        assert_eq!(ttl_duration(u64::MAX), capped);
        assert_eq!(ttl_duration(MAX_TTL_SECONDS + 1), capped);
        assert_eq!(ttl_duration(0), None);
        assert_eq!(
            Config::new().with_default_ttl(u64::MAX).default_ttl_duration(),
            capped
        );
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("DEFAULT_TTL", "45");
        env::set_var("CACHE_DEBUG", "TRUE");
        let config = Config::from_env();
        assert_eq!(config.default_ttl, Some(45));
        assert!(config.debug);

        env::set_var("DEFAULT_TTL", "0");
        env::set_var("CACHE_DEBUG", "off");
        let config = Config::from_env();
        assert_eq!(config.default_ttl, None);
        assert!(!config.debug);

        env::remove_var("DEFAULT_TTL");
        env::remove_var("CACHE_DEBUG");
        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"default_ttl": 10}"#).unwrap();
        assert_eq!(config, Config::new().with_default_ttl(10));

        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" Yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
