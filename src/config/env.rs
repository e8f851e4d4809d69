//! Environment overlay for `ScrapeConfig`
//!
//! The binary is configured through `RATESCRAPE_*` variables. Unset variables
//! keep the builder defaults; set-but-malformed ones are errors.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::types::ScrapeConfig;
use crate::utils::DEFAULT_API_BASE_URL;

const ENV_PREFIX: &str = "RATESCRAPE_";

impl ScrapeConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    ///
    /// `lookup` receives full variable names (`RATESCRAPE_API_BASE`, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base = get("API_BASE").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let mut builder = Self::builder().api_base_url(api_base);

        if let Some(addr) = get("LISTEN") {
            builder = builder.listen_addr(addr);
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            builder = builder.allowed_origins(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(path) = get("STORAGE") {
            builder = builder.storage_path(PathBuf::from(path));
        }
        if let Some(headless) = get("HEADLESS") {
            builder = builder.headless(parse_bool("HEADLESS", &headless)?);
        }
        if let Some(secs) = get("CONTEXT_TIMEOUT_SECS") {
            builder = builder.context_timeout(Duration::from_secs(parse_num("CONTEXT_TIMEOUT_SECS", &secs)?));
        }
        if let Some(ms) = get("INTER_JOB_DELAY_MS") {
            builder = builder.inter_job_delay(Duration::from_millis(parse_num("INTER_JOB_DELAY_MS", &ms)?));
        }
        if let Some(ms) = get("POLL_INTERVAL_MS") {
            builder = builder.poll_interval(Duration::from_millis(parse_num("POLL_INTERVAL_MS", &ms)?));
        }
        if let Some(dir) = get("CHROME_DATA_DIR") {
            builder = builder.chrome_data_dir(Some(PathBuf::from(dir)));
        }
        if let Some(currency) = get("CURRENCY") {
            builder = builder.currency(currency);
        }

        builder.build()
    }
}

fn parse_num<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{ENV_PREFIX}{name} must be a number, got '{raw}'"))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{ENV_PREFIX}{name} must be a boolean, got '{other}'"),
    }
}
