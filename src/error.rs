//! Per-job error taxonomy.
//!
//! Every failure a job can hit maps onto one of four kinds. None of them is
//! fatal to the queue: they end the one job and are logged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Wire-level name of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingUrl,
    InjectionFailed,
    Timeout,
    IngestionFailure,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingUrl => "MISSING_URL",
            Self::InjectionFailed => "INJECTION_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::IngestionFailure => "INGESTION_FAILURE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error terminating a single scrape job
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScrapeError {
    /// Job carried no URL; no browsing context was opened
    #[error("job has no url")]
    MissingUrl,

    /// Context could not be opened or the instrumentation could not be loaded
    #[error("instrumentation could not be loaded: {0}")]
    InjectionFailed(String),

    /// No terminal result arrived within the budget
    #[error("no result within {0:?}")]
    Timeout(Duration),

    /// Talking to the ingestion backend failed
    #[error("ingestion failed: {0}")]
    IngestionFailure(String),
}

impl ScrapeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingUrl => ErrorKind::MissingUrl,
            Self::InjectionFailed(_) => ErrorKind::InjectionFailed,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::IngestionFailure(_) => ErrorKind::IngestionFailure,
        }
    }
}

impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain
        Self::InjectionFailed(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `ScrapeError`
pub type JobResult<T> = Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(ScrapeError::MissingUrl.kind().as_str(), "MISSING_URL");
        assert_eq!(
            serde_json::to_string(&ErrorKind::InjectionFailed).unwrap(),
            "\"INJECTION_FAILED\""
        );
        assert_eq!(
            ScrapeError::Timeout(Duration::from_secs(30)).kind(),
            ErrorKind::Timeout
        );
    }
}
