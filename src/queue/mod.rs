//! Job Queue Manager
//!
//! Owns the only shared mutable state of the pipeline: pending jobs, the
//! drain state and the ingestion token. Jobs run strictly one at a time in
//! submission order. At most one drain loop exists; the `Idle -> Draining`
//! transition happens under the same lock as the append, and
//! `Draining -> Idle` under the same lock as the empty check, so an enqueue
//! can never race a loop that is about to exit.

pub mod token_store;

pub use token_store::TokenStore;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ScrapeConfig;
use crate::error::ErrorKind;
use crate::message_bus::{Ack, JobSpec, StartScrape};
use crate::schema::{JobOutcome, ScrapeJob, ScrapeResult};

/// Runs one job to its outcome
pub trait JobRunner: Send + Sync + 'static {
    fn run_job(&self, job: &ScrapeJob) -> impl Future<Output = JobOutcome> + Send;
}

/// Destination for finished rates. Must not fail the caller.
pub trait RateSink: Send + Sync + 'static {
    fn send(
        &self,
        rates: Vec<ScrapeResult>,
        token: Option<&str>,
    ) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainState {
    Idle,
    Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Bound on awaiting a single job
    pub job_await_timeout: Duration,
    /// Pause after every job
    pub inter_job_delay: Duration,
}

impl QueueSettings {
    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            job_await_timeout: config.job_await_timeout(),
            inter_job_delay: config.inter_job_delay(),
        }
    }
}

/// Point-in-time view of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub state: DrainState,
    pub has_token: bool,
}

#[derive(Debug)]
struct QueueState {
    pending: VecDeque<ScrapeJob>,
    state: DrainState,
    auth_token: Option<String>,
}

struct Inner<R, S> {
    state: Mutex<QueueState>,
    runner: R,
    sink: S,
    tokens: Option<TokenStore>,
    settings: QueueSettings,
}

/// Handle to the process-wide queue. Clones share the same state.
pub struct JobQueue<R, S> {
    inner: Arc<Inner<R, S>>,
}

impl<R, S> Clone for JobQueue<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: JobRunner, S: RateSink> JobQueue<R, S> {
    /// Create an idle queue
    ///
    /// With a token store, the persisted token is loaded now and every token
    /// update is written back.
    #[must_use]
    pub fn new(runner: R, sink: S, settings: QueueSettings, tokens: Option<TokenStore>) -> Self {
        let auth_token = tokens.as_ref().and_then(|store| match store.load() {
            Ok(token) => {
                if token.is_some() {
                    info!("Loaded ingestion token from {}", store.path().display());
                }
                token
            }
            Err(e) => {
                warn!("Could not load ingestion token: {e:#}");
                None
            }
        });

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    state: DrainState::Idle,
                    auth_token,
                }),
                runner,
                sink,
                tokens,
                settings,
            }),
        }
    }

    /// Handle a `START_SCRAPE` request
    ///
    /// Stores the token if one came along, enqueues the normalized jobs and
    /// acknowledges with the pending count without waiting for any job.
    pub fn start_scrape(&self, request: StartScrape) -> Ack {
        if let Some(token) = request.token.filter(|t| !t.trim().is_empty()) {
            self.set_token(token);
        }
        let jobs = request.jobs.into_iter().map(JobSpec::into_job).collect();
        Ack::queued(self.enqueue(jobs))
    }

    /// Append jobs and make sure a drain loop is running
    ///
    /// Returns the pending count after the append.
    pub fn enqueue(&self, jobs: Vec<ScrapeJob>) -> usize {
        let added = jobs.len();
        let (pending, start_loop) = {
            let mut state = self.inner.state.lock();
            state.pending.extend(jobs);
            let start_loop = state.state == DrainState::Idle && !state.pending.is_empty();
            if start_loop {
                state.state = DrainState::Draining;
            }
            (state.pending.len(), start_loop)
        };

        info!("Enqueued {added} job(s), {pending} pending");
        if start_loop {
            info!("Queue Idle -> Draining");
            tokio::spawn(self.clone().drain());
        }
        pending
    }

    /// Replace the ingestion token and persist it
    pub fn set_token(&self, token: String) {
        if let Some(store) = &self.inner.tokens
            && let Err(e) = store.save(&token)
        {
            warn!("Could not persist ingestion token: {e:#}");
        }
        self.inner.state.lock().auth_token = Some(token);
        info!("Ingestion token updated");
    }

    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.state.lock();
        QueueSnapshot {
            pending: state.pending.len(),
            state: state.state,
            has_token: state.auth_token.is_some(),
        }
    }

    async fn drain(self) {
        loop {
            let job = {
                let mut state = self.inner.state.lock();
                match state.pending.pop_front() {
                    Some(job) => job,
                    None => {
                        state.state = DrainState::Idle;
                        break;
                    }
                }
            };

            self.process(job).await;
            tokio::time::sleep(self.inner.settings.inter_job_delay).await;
        }
        info!("Queue drained, Draining -> Idle");
    }

    async fn process(&self, job: ScrapeJob) {
        info!("Starting job {} for competitor {}", job.id, job.competitor_id);
        let timeout = self.inner.settings.job_await_timeout;
        let run = AssertUnwindSafe(self.inner.runner.run_job(&job)).catch_unwind();

        let results = match tokio::time::timeout(timeout, run).await {
            Err(_) => {
                warn!(
                    "Job {} failed [{}]: not finished within {timeout:?}",
                    job.id,
                    ErrorKind::Timeout
                );
                return;
            }
            Ok(Err(_)) => {
                error!("Job {} panicked", job.id);
                return;
            }
            Ok(Ok(Err(e))) => {
                warn!("Job {} failed [{}]: {e}", job.id, e.kind());
                return;
            }
            Ok(Ok(Ok(results))) => results,
        };

        if results.is_empty() {
            debug!("Job {} finished without rates", job.id);
            return;
        }

        info!("Job {} finished with {} rate(s)", job.id, results.len());
        let token = self.inner.state.lock().auth_token.clone();
        self.inner.sink.send(results, token.as_deref()).await;
    }
}
