//! Runtime configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HAZARD_FETCH_TIMEOUT_SECS` | 3 |
//! | `HAZARD_COLLECT_TIMEOUT_SECS` | 5 |
//! | `HAZARD_MAX_WORKERS` | 4 |
//! | `HAZARD_PROBABILITY_URL` | J-SHIS mesh-info endpoint |
//! | `HAZARD_FILL_LAND_DIR` | unset (large fill land disabled) |

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use hazard_map_hazard_models::FetchOptions;
use hazard_map_probability::DEFAULT_JSHIS_URL;

pub const FETCH_TIMEOUT_VAR: &str = "HAZARD_FETCH_TIMEOUT_SECS";
pub const COLLECT_TIMEOUT_VAR: &str = "HAZARD_COLLECT_TIMEOUT_SECS";
pub const MAX_WORKERS_VAR: &str = "HAZARD_MAX_WORKERS";
pub const PROBABILITY_URL_VAR: &str = "HAZARD_PROBABILITY_URL";
pub const FILL_LAND_DIR_VAR: &str = "HAZARD_FILL_LAND_DIR";

/// Settings for building an HTTP-backed
/// [`HazardAggregator`](crate::HazardAggregator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub fetch: FetchOptions,
    /// Base URL of the point-probability API.
    pub probability_url: String,
    /// Directory holding one large-fill-land `GeoJSON` file per prefecture.
    pub fill_land_dir: Option<PathBuf>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            probability_url: DEFAULT_JSHIS_URL.to_string(),
            fill_land_dir: None,
        }
    }
}

impl AggregatorConfig {
    /// Reads the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Invalid values are
    /// logged and replaced by their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let fetch_timeout = Duration::from_secs(parse_or(
            &lookup,
            FETCH_TIMEOUT_VAR,
            defaults.fetch.fetch_timeout.as_secs(),
        ));
        let mut collect_timeout = Duration::from_secs(parse_or(
            &lookup,
            COLLECT_TIMEOUT_VAR,
            defaults.fetch.collect_timeout.as_secs(),
        ));
        if collect_timeout <= fetch_timeout {
            let adjusted = fetch_timeout + Duration::from_secs(2);
            log::warn!(
                "{COLLECT_TIMEOUT_VAR} ({collect_timeout:?}) must exceed {FETCH_TIMEOUT_VAR} ({fetch_timeout:?}), using {adjusted:?}"
            );
            collect_timeout = adjusted;
        }

        let mut max_workers = parse_or(&lookup, MAX_WORKERS_VAR, defaults.fetch.max_workers);
        if max_workers == 0 {
            log::warn!("{MAX_WORKERS_VAR} must be at least 1, using {}", defaults.fetch.max_workers);
            max_workers = defaults.fetch.max_workers;
        }

        let probability_url = lookup(PROBABILITY_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.probability_url);

        let fill_land_dir = lookup(FILL_LAND_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Self {
            fetch: FetchOptions {
                fetch_timeout,
                collect_timeout,
                max_workers,
            },
            probability_url,
            fill_land_dir,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        log::warn!("Invalid {key} value {raw:?}, using {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> AggregatorConfig {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AggregatorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]), AggregatorConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            (FETCH_TIMEOUT_VAR, "10"),
            (COLLECT_TIMEOUT_VAR, "15"),
            (MAX_WORKERS_VAR, " 8 "),
            (PROBABILITY_URL_VAR, "http://localhost:9000/meshinfo"),
            (FILL_LAND_DIR_VAR, "/data/fill_land"),
        ]);

        assert_eq!(config.fetch.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.collect_timeout, Duration::from_secs(15));
        assert_eq!(config.fetch.max_workers, 8);
        assert_eq!(config.probability_url, "http://localhost:9000/meshinfo");
        assert_eq!(config.fill_land_dir, Some(PathBuf::from("/data/fill_land")));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            (FETCH_TIMEOUT_VAR, "soon"),
            (MAX_WORKERS_VAR, "0"),
            (PROBABILITY_URL_VAR, "  "),
            (FILL_LAND_DIR_VAR, ""),
        ]);

        assert_eq!(config, AggregatorConfig::default());
    }

    #[test]
    fn collect_timeout_is_kept_above_fetch_timeout() {
        let config = config_from(&[(FETCH_TIMEOUT_VAR, "6"), (COLLECT_TIMEOUT_VAR, "4")]);

        assert_eq!(config.fetch.fetch_timeout, Duration::from_secs(6));
        assert_eq!(config.fetch.collect_timeout, Duration::from_secs(8));
    }
}
