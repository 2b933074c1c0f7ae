use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Longest accepted feed look-back, in days
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Runtime configuration loaded from environment variables.
///
/// | Env Var              | Default             |
/// |----------------------|---------------------|
/// | `RENTAL_DB_PATH`     | `rental_ledger.db`  |
/// | `RENTAL_SEED_FILE`   | unset               |
/// | `FEED_TIMEOUT_SECS`  | `15`                |
/// | `FEED_LOOKBACK_DAYS` | `30` (0 to 3650)    |
/// | `SYNC_INTERVAL_SECS` | unset (run once)    |
/// | `SYNC_OUTPUT_PATH`   | `occupancy.json`    |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub seed_file: Option<PathBuf>,
    pub feed_timeout: Duration,
    pub lookback_days: i64,
    pub sync_interval: Option<Duration>,
    pub output_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("rental_ledger.db"),
            seed_file: None,
            feed_timeout: Duration::from_secs(15),
            lookback_days: 30,
            sync_interval: None,
            output_path: PathBuf::from("occupancy.json"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let feed_timeout = match var("FEED_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("FEED_TIMEOUT_SECS", &raw)?),
            None => defaults.feed_timeout,
        };
        let lookback_days = match var("FEED_LOOKBACK_DAYS") {
            Some(raw) => {
                let days: i64 = parse_var("FEED_LOOKBACK_DAYS", &raw)?;
                if !(0..=MAX_LOOKBACK_DAYS).contains(&days) {
                    return Err(invalid("FEED_LOOKBACK_DAYS", &raw));
                }
                days
            }
            None => defaults.lookback_days,
        };
        let sync_interval = match var("SYNC_INTERVAL_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_var("SYNC_INTERVAL_SECS", &raw)?)),
            None => None,
        };

        Ok(Self {
            db_path: var("RENTAL_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            seed_file: var("RENTAL_SEED_FILE").map(PathBuf::from),
            feed_timeout,
            lookback_days,
            sync_interval,
            output_path: var("SYNC_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
        })
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(name, raw))
}

fn invalid(name: &str, raw: &str) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        value: raw.to_string(),
    }
}
