use serde::Deserialize;

/// Application-level constants
pub const APP_NAME: &str = "phr-metrics";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment overrides read by `EngineConfig::from_env`.
pub const ENV_CACHE_CAPACITY: &str = "PHR_CACHE_CAPACITY";
pub const ENV_RECENT_ACTIVITY_DAYS: &str = "PHR_RECENT_ACTIVITY_DAYS";
pub const ENV_URGENT_LIMIT: &str = "PHR_URGENT_LIMIT";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "phr_metrics=info,warn"
}

/// Tunables of the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entries held by the summary cache.
    pub cache_capacity: usize,
    /// Age in whole days up to which a record counts as recent activity.
    pub recent_activity_days: i64,
    pub summary_top_doctors: usize,
    pub summary_top_conditions: usize,
    /// Entries in the combined urgent listing.
    pub urgent_listing_limit: usize,
    pub least_busy_default: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            recent_activity_days: 30,
            summary_top_doctors: 3,
            summary_top_conditions: 5,
            urgent_listing_limit: 10,
            least_busy_default: 3,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with any environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = parse_override(&lookup, ENV_CACHE_CAPACITY) {
            config.cache_capacity = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_RECENT_ACTIVITY_DAYS) {
            config.recent_activity_days = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_URGENT_LIMIT) {
            config.urgent_listing_limit = v;
        }
        config
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable config override");
            None
        }
    }
}
