//! Shared configuration constants for ratescrape
//!
//! Default values and fixed protocol names used throughout the codebase to
//! ensure consistency and avoid magic numbers.

/// Hard per-context timeout: 45 seconds
///
/// Upper bound on how long a browsing context may stay open waiting for a
/// terminal result. Must hold the page-load wait plus the full polling
/// budget of the slowest site strategy; `build()` rejects anything shorter.
pub const DEFAULT_CONTEXT_TIMEOUT_SECS: u64 = 45;

/// Extra slack the queue grants on top of the context timeout before it
/// gives up awaiting the orchestrator.
pub const JOB_AWAIT_GRACE_SECS: u64 = 15;

/// Pause between two jobs: 2 seconds
///
/// Bounds the rate at which new browsing contexts are opened against the
/// competitor sites.
pub const DEFAULT_INTER_JOB_DELAY_MS: u64 = 2_000;

/// Interval between two polling attempts of the strategy engine
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Timeout for the page "finished loading" wait
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 20;

/// Timeout for a single ingestion POST
pub const DEFAULT_INGEST_TIMEOUT_SECS: u64 = 15;

/// Default API base used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8001/api/v1";

/// Default address of the inbound trigger listener
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8765";

/// Ingestion endpoint path, relative to the API base
pub const INGEST_PATH: &str = "competitors/rates/ingest";

/// Currency reported with every rate unless configured otherwise
pub const DEFAULT_CURRENCY: &str = "INR";

/// Durable key under which the bearer token is persisted
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Room-type label emitted when the polling budget runs out
pub const TIMEOUT_ROOM_TYPE: &str = "Timeout/Sold Out";

/// Room-type label used when a page shows no room name
pub const DEFAULT_ROOM_TYPE: &str = "Standard";

/// Chrome user agent string for stealth mode
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
