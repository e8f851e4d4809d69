//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! The API base URL is the one field without a sensible default, so `build()`
//! only exists once it has been supplied.

use anyhow::{Result, anyhow, bail};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use super::types::{ScrapeConfig, default_storage_path};
use crate::strategy::Site;
use crate::utils::{
    DEFAULT_CONTEXT_TIMEOUT_SECS, DEFAULT_CURRENCY, DEFAULT_INGEST_TIMEOUT_SECS,
    DEFAULT_INTER_JOB_DELAY_MS, DEFAULT_LISTEN_ADDR, DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
    DEFAULT_POLL_INTERVAL_MS,
};

// Type states for the builder
pub struct WithApiBase;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) api_base_url: Option<String>,
    pub(crate) listen_addr: String,
    pub(crate) allowed_origins: Vec<String>,
    pub(crate) storage_path: Option<PathBuf>,
    pub(crate) context_timeout_ms: u64,
    pub(crate) job_await_timeout_ms: Option<u64>,
    pub(crate) inter_job_delay_ms: u64,
    pub(crate) poll_interval_ms: u64,
    pub(crate) page_load_timeout_ms: u64,
    pub(crate) ingest_timeout_ms: u64,
    pub(crate) headless: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) currency: String,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            api_base_url: None,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            allowed_origins: Vec::new(),
            storage_path: None,
            context_timeout_ms: DEFAULT_CONTEXT_TIMEOUT_SECS * 1000,
            job_await_timeout_ms: None,
            inter_job_delay_ms: DEFAULT_INTER_JOB_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            page_load_timeout_ms: DEFAULT_PAGE_LOAD_TIMEOUT_SECS * 1000,
            ingest_timeout_ms: DEFAULT_INGEST_TIMEOUT_SECS * 1000,
            headless: true,
            chrome_data_dir: None,
            currency: DEFAULT_CURRENCY.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl<S> ScrapeConfigBuilder<S> {
    fn into_state<T>(self) -> ScrapeConfigBuilder<T> {
        ScrapeConfigBuilder {
            api_base_url: self.api_base_url,
            listen_addr: self.listen_addr,
            allowed_origins: self.allowed_origins,
            storage_path: self.storage_path,
            context_timeout_ms: self.context_timeout_ms,
            job_await_timeout_ms: self.job_await_timeout_ms,
            inter_job_delay_ms: self.inter_job_delay_ms,
            poll_interval_ms: self.poll_interval_ms,
            page_load_timeout_ms: self.page_load_timeout_ms,
            ingest_timeout_ms: self.ingest_timeout_ms,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
            currency: self.currency,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    #[must_use]
    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    #[must_use]
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn context_timeout(mut self, timeout: Duration) -> Self {
        self.context_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn job_await_timeout(mut self, timeout: Duration) -> Self {
        self.job_await_timeout_ms = Some(millis(timeout));
        self
    }

    #[must_use]
    pub fn inter_job_delay(mut self, delay: Duration) -> Self {
        self.inter_job_delay_ms = millis(delay);
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = millis(interval);
        self
    }

    #[must_use]
    pub fn page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn ingest_timeout(mut self, timeout: Duration) -> Self {
        self.ingest_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.chrome_data_dir = dir;
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn api_base_url(mut self, url: impl Into<String>) -> ScrapeConfigBuilder<WithApiBase> {
        self.api_base_url = Some(url.into().trim().trim_end_matches('/').to_string());
        self.into_state()
    }
}

// Build method only available when all required fields are set
impl ScrapeConfigBuilder<WithApiBase> {
    pub fn build(self) -> Result<ScrapeConfig> {
        let api_base_url = self
            .api_base_url
            .ok_or_else(|| anyhow!("api_base_url is required"))?;

        let parsed = Url::parse(&api_base_url)
            .map_err(|e| anyhow!("Invalid api_base_url '{api_base_url}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("api_base_url must be http or https, got '{}'", parsed.scheme());
        }

        if self.context_timeout_ms == 0 {
            bail!("context_timeout must be non-zero");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval must be non-zero");
        }
        if self.page_load_timeout_ms == 0 || self.ingest_timeout_ms == 0 {
            bail!("page_load_timeout and ingest_timeout must be non-zero");
        }

        // the page-load wait and every polling attempt run inside the context timeout
        let attempts = u64::from(Site::largest_attempt_budget());
        let required_ms = self
            .page_load_timeout_ms
            .saturating_add(attempts.saturating_mul(self.poll_interval_ms));
        if self.context_timeout_ms < required_ms {
            bail!(
                "context_timeout ({}ms) must cover page_load_timeout ({}ms) plus {attempts} polls of {}ms ({required_ms}ms)",
                self.context_timeout_ms,
                self.page_load_timeout_ms,
                self.poll_interval_ms
            );
        }

        if let Some(await_ms) = self.job_await_timeout_ms
            && await_ms < self.context_timeout_ms
        {
            bail!(
                "job_await_timeout ({await_ms}ms) must not be shorter than context_timeout ({}ms)",
                self.context_timeout_ms
            );
        }
        if self.currency.trim().is_empty() {
            bail!("currency must not be empty");
        }

        Ok(ScrapeConfig {
            api_base_url,
            listen_addr: self.listen_addr,
            allowed_origins: self.allowed_origins,
            storage_path: self.storage_path.unwrap_or_else(default_storage_path),
            context_timeout_ms: self.context_timeout_ms,
            job_await_timeout_ms: self.job_await_timeout_ms,
            inter_job_delay_ms: self.inter_job_delay_ms,
            poll_interval_ms: self.poll_interval_ms,
            page_load_timeout_ms: self.page_load_timeout_ms,
            ingest_timeout_ms: self.ingest_timeout_ms,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
            currency: self.currency,
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
