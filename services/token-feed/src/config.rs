//! Configuration for the token feed
//!
//! Plain structs with defaults; the binary can override a few knobs from
//! `TOKEN_FEED_*` environment variables.

use std::time::Duration;

use thiserror::Error;
use types::errors::ParseError;
use types::token::Category;

/// Configuration for the live-update channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Lower bound of the jittered emission period.
    pub min_interval: Duration,
    /// Upper bound of the jittered emission period.
    pub max_interval: Duration,
    /// RNG seed for selection, mutation and jitter. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(2000),
            max_interval: Duration::from_millis(5000),
            seed: None,
        }
    }
}

/// Configuration for bulk loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Tokens requested per category.
    pub batch_size: usize,
    /// Give up on a fetch after this long.
    pub fetch_timeout: Duration,
    /// A loaded category is considered fresh for this long.
    pub stale_after: Duration,
    /// Period of the background refresh loop.
    pub refresh_interval: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            fetch_timeout: Duration::from_secs(10),
            stale_after: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(60),
        }
    }
}

/// Configuration for the simulated upstream source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Simulated request latency.
    pub latency: Duration,
    pub seed: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1000),
            seed: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub channel: ChannelConfig,
    pub loader: LoaderConfig,
    pub source: SourceConfig,
    /// Category observed at startup.
    pub observed: Category,
    /// How long the binary runs before shutting down.
    pub run_for: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            loader: LoaderConfig::default(),
            source: SourceConfig::default(),
            observed: Category::New,
            run_for: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FeedConfig {
    /// Defaults overridden by `TOKEN_FEED_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each known key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(seed) = parse_u64(&lookup, "TOKEN_FEED_SEED")? {
            config.channel.seed = Some(seed);
            // distinct stream for the source so bulk loads and updates differ
            config.source.seed = Some(seed.wrapping_add(1));
        }
        if let Some(ms) = parse_u64(&lookup, "TOKEN_FEED_MIN_INTERVAL_MS")? {
            config.channel.min_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, "TOKEN_FEED_MAX_INTERVAL_MS")? {
            config.channel.max_interval = Duration::from_millis(ms);
        }
        if let Some(count) = parse_u64(&lookup, "TOKEN_FEED_BATCH_SIZE")? {
            config.loader.batch_size = count as usize;
        }
        if let Some(ms) = parse_u64(&lookup, "TOKEN_FEED_LATENCY_MS")? {
            config.source.latency = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, "TOKEN_FEED_RUN_SECS")? {
            config.run_for = Duration::from_secs(secs);
        }
        if let Some(category) = lookup("TOKEN_FEED_CATEGORY") {
            config.observed = category.parse()?;
        }

        if config.channel.max_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "TOKEN_FEED_MAX_INTERVAL_MS",
                value: "emission interval must be greater than 0ms".to_string(),
            });
        }
        if config.channel.min_interval > config.channel.max_interval {
            return Err(ConfigError::InvalidValue {
                key: "TOKEN_FEED_MIN_INTERVAL_MS",
                value: format!(
                    "{}ms exceeds max interval {}ms",
                    config.channel.min_interval.as_millis(),
                    config.channel.max_interval.as_millis()
                ),
            });
        }

        Ok(config)
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.channel.min_interval, Duration::from_millis(2000));
        assert_eq!(config.channel.max_interval, Duration::from_millis(5000));
        assert_eq!(config.loader.batch_size, 20);
        assert_eq!(config.source.latency, Duration::from_millis(1000));
        assert_eq!(config.observed, Category::New);
    }

    #[test]
    fn test_empty_lookup_is_default() {
        let config = FeedConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, FeedConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            ("TOKEN_FEED_SEED", "42"),
            ("TOKEN_FEED_MIN_INTERVAL_MS", "100"),
            ("TOKEN_FEED_MAX_INTERVAL_MS", "200"),
            ("TOKEN_FEED_CATEGORY", "migrated"),
            ("TOKEN_FEED_RUN_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.channel.seed, Some(42));
        assert_eq!(config.source.seed, Some(43));
        assert_eq!(config.channel.min_interval, Duration::from_millis(100));
        assert_eq!(config.observed, Category::Migrated);
        assert_eq!(config.run_for, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_number() {
        let err = FeedConfig::from_lookup(lookup_from(&[("TOKEN_FEED_SEED", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TOKEN_FEED_SEED", .. }));
    }

    #[test]
    fn test_unknown_category() {
        let err =
            FeedConfig::from_lookup(lookup_from(&[("TOKEN_FEED_CATEGORY", "graduated")])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_interval_band_rejected() {
        let err = FeedConfig::from_lookup(lookup_from(&[
            ("TOKEN_FEED_MIN_INTERVAL_MS", "0"),
            ("TOKEN_FEED_MAX_INTERVAL_MS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TOKEN_FEED_MAX_INTERVAL_MS", .. }));

        // a zero lower bound is fine as long as the band has width
        let config = FeedConfig::from_lookup(lookup_from(&[("TOKEN_FEED_MIN_INTERVAL_MS", "0")])).unwrap();
        assert_eq!(config.channel.min_interval, Duration::ZERO);
    }

    #[test]
    fn test_inverted_interval_band() {
        let err = FeedConfig::from_lookup(lookup_from(&[
            ("TOKEN_FEED_MIN_INTERVAL_MS", "6000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
