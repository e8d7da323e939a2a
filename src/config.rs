use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// What a daily rollover does with records from earlier days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Keep every day's record for history and stats.
    #[default]
    Retain,
    /// Drop everything except today's records.
    KeepToday,
}

impl RetentionPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "retain" => Some(Self::Retain),
            "keep-today" => Some(Self::KeepToday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub rollover_interval: Duration,
    pub retention: RetentionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            data_dir: PathBuf::from("data"),
            rollover_interval: Duration::from_secs(60),
            retention: RetentionPolicy::Retain,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: parse_var("BIND_ADDR", |v| v.parse().ok()).unwrap_or(defaults.bind_addr),
            port: parse_var("PORT", |v| v.parse().ok()).unwrap_or(defaults.port),
            data_dir: env::var("APP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            rollover_interval: parse_var("ROLLOVER_INTERVAL_SECS", |v| {
                v.parse::<u64>().ok().filter(|secs| *secs > 0)
            })
            .map(Duration::from_secs)
            .unwrap_or(defaults.rollover_interval),
            retention: parse_var("TRACKER_RETENTION", RetentionPolicy::parse)
                .unwrap_or(defaults.retention),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_var<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let value = env::var(name).ok()?;
    let parsed = parse(&value);
    if parsed.is_none() {
        warn!("ignoring invalid {name}={value:?}, using default");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_policy_parses_known_values() {
        assert_eq!(RetentionPolicy::parse("retain"), Some(RetentionPolicy::Retain));
        assert_eq!(RetentionPolicy::parse(" keep-today "), Some(RetentionPolicy::KeepToday));
        assert_eq!(RetentionPolicy::parse("forever"), None);
    }

    #[test]
    fn defaults_bind_to_localhost() {
        let config = Config::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.rollover_interval, Duration::from_secs(60));
    }
}
