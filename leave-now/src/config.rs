//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;

use crate::cache::CacheConfig;
use crate::feed::FeedConfig;
use crate::scheduler::SchedulerConfig;

/// Default address for the control surface.
const DEFAULT_LISTEN_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Where arrival boards come from.
#[derive(Debug, Clone)]
pub enum FeedSource {
    /// The live arrival service.
    Live(FeedConfig),
    /// `{stop_id}.json` fixtures in a directory.
    Mock(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedSource,
    pub cache: CacheConfig,
    pub scheduler: SchedulerConfig,
    /// JSON array of route registrations loaded at startup.
    pub routes_file: Option<PathBuf>,
    /// Where dismissals are persisted. In memory only if unset.
    pub suppression_file: Option<PathBuf>,
    pub listen_addr: SocketAddr,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let mut scheduler = SchedulerConfig::default();
        if let Some(secs) = parse_var::<u64>(&get, "POLL_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(invalid("POLL_INTERVAL_SECS", "0", "must be positive"));
            }
            scheduler = scheduler.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64>(&get, "FETCH_TIMEOUT_SECS")? {
            scheduler = scheduler.with_fetch_timeout(Duration::from_secs(secs));
        }
        if let Some(mins) = parse_var::<i64>(&get, "FIRE_BUFFER_MINS")? {
            scheduler = scheduler.with_fire_buffer(mins);
        }
        if let Some(value) = get("ACTIVE_UNTIL") {
            let until = NaiveTime::parse_from_str(value.trim(), "%H:%M")
                .map_err(|e| invalid("ACTIVE_UNTIL", &value, &e.to_string()))?;
            scheduler = scheduler.with_active_until(Some(until));
        }

        let feed = match get("FEED_MOCK_DIR") {
            Some(dir) => FeedSource::Mock(PathBuf::from(dir)),
            None => {
                let key = get("TAGO_SERVICE_KEY").ok_or(ConfigError::Missing("TAGO_SERVICE_KEY"))?;
                let mut config = FeedConfig::new(key)
                    .with_timeout(scheduler.fetch_timeout.as_secs().max(1));
                if let Some(url) = get("FEED_BASE_URL") {
                    config = config.with_base_url(url);
                }
                FeedSource::Live(config)
            }
        };

        let listen_addr = parse_var::<SocketAddr>(&get, "LISTEN_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_LISTEN_ADDR));

        Ok(Self {
            feed,
            cache: CacheConfig::default(),
            scheduler,
            routes_file: get("ROUTES_FILE").map(PathBuf::from),
            suppression_file: get("SUPPRESSION_FILE").map(PathBuf::from),
            listen_addr,
        })
    }
}

fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| invalid(var, &value, &e.to_string()))
        })
        .transpose()
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn live_feed_defaults() {
        let config = load(&[("TAGO_SERVICE_KEY", "secret")]).unwrap();

        let FeedSource::Live(feed) = &config.feed else {
            panic!("expected live feed");
        };
        assert_eq!(feed.service_key, "secret");
        assert_eq!(feed.timeout_secs, 10);
        assert_eq!(config.scheduler.poll_interval, Duration::from_secs(30));
        assert_eq!(config.scheduler.fire_buffer_mins, 2);
        assert!(config.scheduler.active_until.is_none());
        assert!(config.routes_file.is_none());
        assert!(config.suppression_file.is_none());
        assert_eq!(config.listen_addr, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn missing_key_without_mock() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TAGO_SERVICE_KEY")));

        // Blank counts as unset
        let err = load(&[("TAGO_SERVICE_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn mock_dir_needs_no_key() {
        let config = load(&[("FEED_MOCK_DIR", "data/mock_feed")]).unwrap();
        assert!(matches!(config.feed, FeedSource::Mock(ref dir) if dir == &PathBuf::from("data/mock_feed")));
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("TAGO_SERVICE_KEY", "k"),
            ("FEED_BASE_URL", "http://localhost:9999"),
            ("ROUTES_FILE", "routes.json"),
            ("SUPPRESSION_FILE", "state/dismissals.json"),
            ("POLL_INTERVAL_SECS", "15"),
            ("FETCH_TIMEOUT_SECS", "5"),
            ("FIRE_BUFFER_MINS", "3"),
            ("ACTIVE_UNTIL", "09:30"),
            ("LISTEN_ADDR", "0.0.0.0:8080"),
        ])
        .unwrap();

        let FeedSource::Live(feed) = &config.feed else {
            panic!("expected live feed");
        };
        assert_eq!(feed.base_url, "http://localhost:9999");
        assert_eq!(feed.timeout_secs, 5);
        assert_eq!(config.scheduler.poll_interval, Duration::from_secs(15));
        assert_eq!(config.scheduler.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.scheduler.fire_buffer_mins, 3);
        assert_eq!(
            config.scheduler.active_until,
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(config.routes_file, Some(PathBuf::from("routes.json")));
        assert_eq!(
            config.suppression_file,
            Some(PathBuf::from("state/dismissals.json"))
        );
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[test]
    fn invalid_values() {
        let err = load(&[("FEED_MOCK_DIR", "d"), ("POLL_INTERVAL_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "POLL_INTERVAL_SECS", .. }));

        let err = load(&[("FEED_MOCK_DIR", "d"), ("POLL_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "POLL_INTERVAL_SECS", .. }));

        let err = load(&[("FEED_MOCK_DIR", "d"), ("ACTIVE_UNTIL", "25:00")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "ACTIVE_UNTIL", .. }));

        let err = load(&[("FEED_MOCK_DIR", "d"), ("LISTEN_ADDR", "nowhere")]).unwrap_err();
        assert!(err.to_string().starts_with("invalid LISTEN_ADDR=\"nowhere\""));
    }
}
