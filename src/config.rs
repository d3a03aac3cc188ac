//! Runtime configuration, read from the process environment.
//!
//! A `.env` file in the working directory is loaded first (if present), then
//! each setting is resolved as: environment variable → built-in default.
//! The bearer token is the only required value.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DashError, Result};

pub const DEFAULT_QUERY: &str = "(#rustlang OR @rustlang) -is:retweet";
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const DEFAULT_POLL_SECS: u64 = 2;
const DEFAULT_RENDER_SECS: u64 = 1;
const DEFAULT_LOOKBACK_HOURS: u64 = 24;

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub query: String,
    pub api_base: String,
    pub poll_interval: Duration,
    pub render_interval: Duration,
    /// How far back the very first search reaches when no cursor exists.
    pub lookback: chrono::Duration,
    pub log_path: PathBuf,
}

impl Config {
    /// Load `.env` (if any) and resolve the configuration from the process
    /// environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration through an arbitrary key lookup.
    ///
    /// Split out from [`Config::load`] so tests don't have to mutate the real
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TWITTER_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                DashError::Config("missing TWITTER_TOKEN environment variable".into())
            })?;

        let query = lookup("LIVESCROLL_QUERY")
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());

        let api_base = lookup("LIVESCROLL_API_BASE")
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let poll_secs = positive(&lookup, "LIVESCROLL_POLL_SECS", DEFAULT_POLL_SECS)?;
        let render_secs = positive(&lookup, "LIVESCROLL_RENDER_SECS", DEFAULT_RENDER_SECS)?;
        let lookback_hours =
            positive(&lookup, "LIVESCROLL_LOOKBACK_HOURS", DEFAULT_LOOKBACK_HOURS)?;

        let log_path = lookup("LIVESCROLL_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("livescroll-tweets.log"));

        Ok(Self {
            token,
            query,
            api_base,
            poll_interval: Duration::from_secs(poll_secs),
            render_interval: Duration::from_secs(render_secs),
            lookback: chrono::Duration::hours(lookback_hours as i64),
            log_path,
        })
    }
}

fn positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(DashError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
        Ok(n) => Ok(n),
    }
}
