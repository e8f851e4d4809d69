//! Core configuration type for the rate scraping worker

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct for the worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Base of the backend API, e.g. `http://127.0.0.1:8001/api/v1`.
    ///
    /// **INVARIANT:** absolute http(s) URL without a trailing slash
    /// (normalized in builder).
    pub(crate) api_base_url: String,

    /// Address the inbound trigger listener binds to
    pub(crate) listen_addr: String,

    /// Origins allowed to submit `START_SCRAPE`. Empty accepts any origin.
    pub(crate) allowed_origins: Vec<String>,

    /// Durable key-value file holding the bearer token
    pub(crate) storage_path: PathBuf,

    /// Hard timeout per browsing context
    ///
    /// Default: 45 seconds. **INVARIANT:** covers `page_load_timeout_ms`
    /// plus the largest attempt budget times `poll_interval_ms`.
    pub(crate) context_timeout_ms: u64,

    /// How long the queue awaits the orchestrator for one job
    ///
    /// Default: context timeout + 15 seconds
    pub(crate) job_await_timeout_ms: Option<u64>,

    /// Pause after every job before the next one starts
    ///
    /// Default: 2000 ms
    pub(crate) inter_job_delay_ms: u64,

    /// Interval between two strategy polling attempts
    ///
    /// Default: 1000 ms
    pub(crate) poll_interval_ms: u64,

    /// Timeout for the context "finished loading" wait
    ///
    /// Default: 20 seconds
    pub(crate) page_load_timeout_ms: u64,

    /// Timeout for one ingestion POST
    ///
    /// Default: 15 seconds
    pub(crate) ingest_timeout_ms: u64,

    pub(crate) headless: bool,

    /// Chrome user data directory. When unset, a per-process temp dir is used.
    pub(crate) chrome_data_dir: Option<PathBuf>,

    /// Currency attached to every ingested rate
    pub(crate) currency: String,
}

/// Default location of the durable key-value file
#[must_use]
pub fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ratescrape")
        .join("storage.json")
}
