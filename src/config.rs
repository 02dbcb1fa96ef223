//! Runtime configuration read from `PLAYOFF_ODDS_*` environment variables.

use std::env;
use std::path::PathBuf;

use crate::projector::DEFAULT_TRIALS;
use crate::season::weeks::DEFAULT_WEEK_GAP_DAYS;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MAX_TRIALS: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: String,
    pub data_dir: PathBuf,
    /// Trials used when a request does not name a count.
    pub default_trials: u32,
    /// Upper bound accepted from API requests.
    pub max_trials: u32,
    pub week_gap_days: i64,
    /// Worker threads for projection; 0 means all cores.
    pub workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_trials: DEFAULT_TRIALS,
            max_trials: DEFAULT_MAX_TRIALS,
            week_gap_days: DEFAULT_WEEK_GAP_DAYS,
            workers: 0,
        }
    }
}

/// Trimmed value of `key`, or `None` when unset or blank.
pub fn env_default(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_default)
    }

    /// Build from any key lookup. Unparseable values keep the default and log a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(bind) = lookup("PLAYOFF_ODDS_BIND") {
            config.bind = bind;
        }
        if let Some(dir) = lookup("PLAYOFF_ODDS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.default_trials = parsed(&lookup, "PLAYOFF_ODDS_TRIALS", config.default_trials);
        config.max_trials = parsed(&lookup, "PLAYOFF_ODDS_MAX_TRIALS", config.max_trials);
        config.week_gap_days = parsed(&lookup, "PLAYOFF_ODDS_WEEK_GAP_DAYS", config.week_gap_days);
        config.workers = parsed(&lookup, "PLAYOFF_ODDS_WORKERS", config.workers);
        if config.default_trials == 0 {
            tracing::warn!("PLAYOFF_ODDS_TRIALS must be at least 1, using {DEFAULT_TRIALS}");
            config.default_trials = DEFAULT_TRIALS;
        }
        if config.max_trials < config.default_trials {
            tracing::warn!(
                max_trials = config.max_trials,
                default_trials = config.default_trials,
                "max trials below default, raising it"
            );
            config.max_trials = config.default_trials;
        }
        config
    }

    /// Directory holding per-tournament bracket configs.
    pub fn brackets_dir(&self) -> PathBuf {
        self.data_dir.join("brackets")
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("invalid {key} '{raw}', defaulting to {default}");
            default
        }),
        None => default,
    }
}
