use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::scheduling::{BusinessHours, SchedulingConfig};

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub server_addr: String,
    /// Upper bound on any single storage call.
    pub storage_timeout: Duration,
    pub scheduling: SchedulingConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable numbers fall back
    /// to their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u32| parse_or(lookup(key), default);

        let defaults = SchedulingConfig::default();
        let scheduling = SchedulingConfig {
            business_hours: BusinessHours::from_hours(
                number("BUSINESS_START_HOUR", 8),
                number("BUSINESS_END_HOUR", 18),
                number("LUNCH_START_HOUR", 12),
                number("LUNCH_END_HOUR", 13),
            ),
            slot_granularity_minutes: number("SLOT_GRANULARITY_MINUTES", defaults.slot_granularity_minutes),
            search_window_days: number("SEARCH_WINDOW_DAYS", defaults.search_window_days),
            max_allocation_attempts: number("ALLOCATION_MAX_ATTEMPTS", defaults.max_allocation_attempts),
            ..defaults
        };
        scheduling.validate()?;

        Ok(Config {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            storage_timeout: Duration::from_secs(parse_or(lookup("STORAGE_TIMEOUT_SECS"), 5u64)),
            scheduling,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
