//! Message shapes exchanged between callers, pages and the host

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::browser::ContextId;
use crate::schema::{JobKind, ScrapeJob, ScrapeResult};

/// Tagged envelope, `{"type": "START_SCRAPE", ...}` or
/// `{"type": "SCRAPE_RESULT", ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    StartScrape(StartScrape),
    ScrapeResult(ScrapeResultMessage),
}

/// Caller asks for a batch of jobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartScrape {
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
    /// Fresher bearer token for the ingestion backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Job as submitted by a caller, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "competitorId", alias = "competitor_id")]
    pub competitor_id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<JobKind>,
}

impl JobSpec {
    /// Normalize into a queueable job
    ///
    /// A missing or blank id gets a fresh UUID. The URL is kept as given;
    /// a missing one resolves to `MISSING_URL` when the job runs.
    #[must_use]
    pub fn into_job(self) -> ScrapeJob {
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut job = ScrapeJob::new(id, self.url, self.competitor_id);
        if let Some(kind) = self.kind {
            job.kind = kind;
        }
        job
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckStatus {
    Queued,
}

/// Immediate answer to `START_SCRAPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: AckStatus,
    /// Pending jobs after the enqueue
    pub count: usize,
}

impl Ack {
    #[must_use]
    pub fn queued(count: usize) -> Self {
        Self {
            status: AckStatus::Queued,
            count,
        }
    }
}

/// Results reported from inside one browsing context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResultMessage {
    #[serde(rename = "contextId", alias = "context_id")]
    pub context_id: ContextId,
    pub results: Vec<ScrapeResult>,
}
