//! Data model shared by the queue, the orchestrator, the strategy engine and
//! the ingestion client.

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// Kind of work a job asks for. Rate scraping is the only live kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    #[default]
    RateScrape,
}

/// A single request to fetch one competitor's current rate
///
/// Immutable once created. The queue hands each job to the orchestrator
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub id: String,
    /// `None` (or blank) resolves to `MISSING_URL` without opening a context
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub competitor_id: String,
}

impl ScrapeJob {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        url: Option<String>,
        competitor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url,
            kind: JobKind::RateScrape,
            competitor_id: competitor_id.into(),
        }
    }

    /// URL if present and non-blank
    #[must_use]
    pub fn target_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// One observed competitor rate, in the shape the ingestion endpoint expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// ISO `YYYY-MM-DD`
    pub check_in_date: String,
    /// Never negative; `0` together with `is_sold_out` means no price seen
    pub price: f64,
    pub room_type: String,
    pub is_sold_out: bool,
    pub competitor_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    crate::utils::DEFAULT_CURRENCY.to_string()
}

/// What a job produces: its rates, or the reason it produced none
pub type JobOutcome = Result<Vec<ScrapeResult>, ScrapeError>;
