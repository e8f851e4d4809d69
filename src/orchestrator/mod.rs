//! Managed browsing context orchestrator
//!
//! Turns one job into one outcome: open a background context on the job's
//! URL, install the instrumentation once the page has loaded, start the
//! engine and wait for the context's `SCRAPE_RESULT`, all under a hard
//! timeout. The context is closed on every path.

pub mod session;

pub use session::ContextSession;

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::browser::{BrowserDriver, BrowsingContext};
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::instrumentation::{EngineTask, INSTRUMENTATION_SCRIPT, spawn_engine};
use crate::message_bus::MessageBus;
use crate::queue::JobRunner;
use crate::schema::{JobOutcome, ScrapeJob};
use crate::utils::{is_valid_url, normalize_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub context_timeout: Duration,
    pub poll_interval: Duration,
    pub currency: String,
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            context_timeout: config.context_timeout(),
            poll_interval: config.poll_interval(),
            currency: config.currency().to_string(),
        }
    }
}

pub struct TabOrchestrator<D> {
    driver: Arc<D>,
    bus: MessageBus,
    settings: OrchestratorSettings,
}

impl<D> Clone for TabOrchestrator<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            bus: self.bus.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<D: BrowserDriver> TabOrchestrator<D> {
    #[must_use]
    pub fn new(driver: D, bus: MessageBus, settings: OrchestratorSettings) -> Self {
        Self {
            driver: Arc::new(driver),
            bus,
            settings,
        }
    }

    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Run one job to exactly one outcome
    pub async fn run_job(&self, job: &ScrapeJob) -> JobOutcome {
        let Some(raw_url) = job.target_url() else {
            warn!("Job {} has no url", job.id);
            return Err(ScrapeError::MissingUrl);
        };
        let url = normalize_url(raw_url);
        if !is_valid_url(&url) {
            warn!("Job {} has an unusable url {raw_url:?}", job.id);
            return Err(ScrapeError::InjectionFailed(format!("invalid url {url}")));
        }

        let context = self.driver.open_background(&url).await.map_err(|e| {
            warn!("Job {}: could not open context for {url}: {e:#}", job.id);
            ScrapeError::InjectionFailed(format!("{e:#}"))
        })?;
        info!("Job {} running in context {}", job.id, context.id());

        // listening before injection so the engine cannot report too early
        let listener = self.bus.listen(context.id().clone());
        let mut session = ContextSession::new(context, listener);

        let timeout = self.settings.context_timeout;
        let outcome = match tokio::time::timeout(timeout, self.drive(&mut session, job, &url)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Job {} timed out after {timeout:?}", job.id);
                Err(ScrapeError::Timeout(timeout))
            }
        };

        session.resolve(outcome).await
    }

    async fn drive(
        &self,
        session: &mut ContextSession<D::Context>,
        job: &ScrapeJob,
        url: &str,
    ) -> JobOutcome {
        let context = session
            .context()
            .cloned()
            .ok_or_else(|| ScrapeError::InjectionFailed("context already closed".to_string()))?;

        if let Err(e) = context.wait_loaded().await {
            warn!("Job {}: load not confirmed ({e:#}), injecting anyway", job.id);
        }

        context.inject(INSTRUMENTATION_SCRIPT).await.map_err(|e| {
            warn!("Job {}: instrumentation failed: {e:#}", job.id);
            ScrapeError::InjectionFailed(format!("{e:#}"))
        })?;

        let task = EngineTask {
            competitor_id: job.competitor_id.clone(),
            url: url.to_string(),
            poll_interval: self.settings.poll_interval,
            currency: self.settings.currency.clone(),
        };
        session.attach_engine(spawn_engine(context, task, self.bus.clone()));

        let listener = session
            .listener_mut()
            .ok_or_else(|| ScrapeError::InjectionFailed("listener detached".to_string()))?;
        let message = listener
            .recv()
            .await
            .map_err(|e| ScrapeError::InjectionFailed(format!("result channel failed: {e}")))?;

        Ok(message.results)
    }
}

impl<D: BrowserDriver> JobRunner for TabOrchestrator<D> {
    async fn run_job(&self, job: &ScrapeJob) -> JobOutcome {
        TabOrchestrator::run_job(self, job).await
    }
}
