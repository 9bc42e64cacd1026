use std::str::FromStr;

use tracing::warn;

pub const DEFAULT_VEHICLE_POSITIONS_URL: &str = "https://gtfs.ztp.krakow.pl/VehiclePositions.pb";
pub const DEFAULT_TRIP_UPDATES_URL: &str = "https://gtfs.ztp.krakow.pl/TripUpdates.pb";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Where the two realtime feeds live and how long to wait for them.
///
/// Read from the environment (a `.env` file is honoured by the binary):
/// `VEHICLE_POSITIONS_URL`, `TRIP_UPDATES_URL`, `FEED_TIMEOUT_SECS` and
/// `FEED_CONNECT_TIMEOUT_SECS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub vehicle_positions_url: String,
    pub trip_updates_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            vehicle_positions_url: DEFAULT_VEHICLE_POSITIONS_URL.to_string(),
            trip_updates_url: DEFAULT_TRIP_UPDATES_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to the
    /// defaults for anything missing or unparseable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            vehicle_positions_url: lookup("VEHICLE_POSITIONS_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.vehicle_positions_url),
            trip_updates_url: lookup("TRIP_UPDATES_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.trip_updates_url),
            timeout_secs: parse_or(&lookup, "FEED_TIMEOUT_SECS", defaults.timeout_secs),
            connect_timeout_secs: parse_or(
                &lookup,
                "FEED_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
        }
    }

    pub fn with_vehicle_positions_url(mut self, url: impl Into<String>) -> Self {
        self.vehicle_positions_url = url.into();
        self
    }

    pub fn with_trip_updates_url(mut self, url: impl Into<String>) -> Self {
        self.trip_updates_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Unparseable config value, using default");
            default
        }),
        None => default,
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = FeedConfig::from_lookup(|_| None);
        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_env_values_override_defaults() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            ("VEHICLE_POSITIONS_URL", "http://localhost:8080/vp.pb"),
            ("TRIP_UPDATES_URL", "http://localhost:8080/tu.pb"),
            ("FEED_TIMEOUT_SECS", "5"),
        ]));

        assert_eq!(config.vehicle_positions_url, "http://localhost:8080/vp.pb");
        assert_eq!(config.trip_updates_url, "http://localhost:8080/tu.pb");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            ("FEED_TIMEOUT_SECS", "soon"),
            ("VEHICLE_POSITIONS_URL", "   "),
        ]));

        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.vehicle_positions_url, DEFAULT_VEHICLE_POSITIONS_URL);
    }
}
