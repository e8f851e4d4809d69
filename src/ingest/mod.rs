//! Backend ingestion client
//!
//! Posts finished rates to `<api base>/competitors/rates/ingest` as
//! `{ "rates": [...] }`, with a bearer token when one is held. `send` never
//! fails: errors are logged and the caller moves on.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::queue::RateSink;
use crate::schema::ScrapeResult;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend answered {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl From<IngestError> for ScrapeError {
    fn from(err: IngestError) -> Self {
        Self::IngestionFailure(err.to_string())
    }
}

#[derive(Serialize)]
struct IngestRequest<'a> {
    rates: &'a [ScrapeResult],
}

#[derive(Debug, Clone)]
pub struct IngestionClient {
    http: Client,
    endpoint: String,
}

impl IngestionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ScrapeConfig) -> anyhow::Result<Self> {
        Self::new(config.ingest_url(), config.ingest_timeout())
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post rates and report what happened
    pub async fn try_send(
        &self,
        rates: &[ScrapeResult],
        token: Option<&str>,
    ) -> Result<(), IngestError> {
        let mut request = self.http.post(&self.endpoint).json(&IngestRequest { rates });
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(IngestError::Status { status, body });
        }
        debug!("Ingestion response: {body}");
        Ok(())
    }

    /// Best-effort post; failures are logged, never returned
    pub async fn send(&self, rates: &[ScrapeResult], token: Option<&str>) {
        if rates.is_empty() {
            return;
        }
        match self.try_send(rates, token).await {
            Ok(()) => info!("Ingested {} rate(s)", rates.len()),
            Err(e) => {
                let err = ScrapeError::from(e);
                warn!("Ingestion of {} rate(s) failed [{}]: {err}", rates.len(), err.kind());
            }
        }
    }
}

impl RateSink for IngestionClient {
    async fn send(&self, rates: Vec<ScrapeResult>, token: Option<&str>) {
        IngestionClient::send(self, &rates, token).await;
    }
}
