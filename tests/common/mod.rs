//! Test utilities shared by the ratescrape integration tests
//!
//! `FakeDriver` stands in for the browser: each URL gets a scripted
//! behavior and every context operation is appended to an event log so
//! tests can assert ordering.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ratescrape::browser::{BrowserDriver, BrowsingContext, ContextId};
use ratescrape::orchestrator::{OrchestratorSettings, TabOrchestrator};
use ratescrape::queue::{JobRunner, RateSink};
use ratescrape::schema::{JobOutcome, ScrapeJob, ScrapeResult};
use ratescrape::strategy::PageSource;
use ratescrape::{MessageBus, ScrapeError};

/// Ordered record of what happened during a test
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.0.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// How a fake context behaves for one URL
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Successive snapshots return these documents; the last one repeats
    Pages(Vec<String>),
    /// Opening the context fails
    FailOpen,
    /// Script evaluation fails
    FailInject,
    /// Snapshots never return
    Hang,
}

/// Artificial latency of every context a driver opens
#[derive(Clone, Copy, Default)]
struct Timing {
    /// Load waits this long and then fails, like an expired load timeout
    failed_load: Option<Duration>,
    snapshot: Duration,
}

struct DriverInner {
    behaviors: Mutex<HashMap<String, Behavior>>,
    timing: Mutex<Timing>,
    fallback: Behavior,
    log: EventLog,
    opened: AtomicUsize,
    snapshots: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeDriver {
    inner: Arc<DriverInner>,
}

impl FakeDriver {
    pub fn new(fallback: Behavior) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                behaviors: Mutex::new(HashMap::new()),
                timing: Mutex::new(Timing::default()),
                fallback,
                log: EventLog::default(),
                opened: AtomicUsize::new(0),
                snapshots: AtomicUsize::new(0),
            }),
        }
    }

    pub fn with(self, url: &str, behavior: Behavior) -> Self {
        self.inner.behaviors.lock().insert(url.to_string(), behavior);
        self
    }

    /// Every load hangs for `after` and then reports a load timeout
    pub fn failing_load(self, after: Duration) -> Self {
        self.inner.timing.lock().failed_load = Some(after);
        self
    }

    /// Every snapshot takes `delay`
    pub fn slow_snapshots(self, delay: Duration) -> Self {
        self.inner.timing.lock().snapshot = delay;
        self
    }

    pub fn log(&self) -> EventLog {
        self.inner.log.clone()
    }

    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> usize {
        self.inner.snapshots.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct FakeContext {
    id: ContextId,
    url: String,
    behavior: Behavior,
    attempt: Arc<AtomicUsize>,
    driver: Arc<DriverInner>,
}

impl BrowserDriver for FakeDriver {
    type Context = FakeContext;

    async fn open_background(&self, url: &str) -> Result<FakeContext> {
        let behavior = self
            .inner
            .behaviors
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.inner.fallback.clone());

        if matches!(behavior, Behavior::FailOpen) {
            self.inner.log.push(format!("open-failed {url}"));
            return Err(anyhow!("browser unavailable"));
        }

        let n = self.inner.opened.fetch_add(1, Ordering::SeqCst) + 1;
        let id = ContextId::new(format!("ctx-{n}"));
        self.inner.log.push(format!("open {id} {url}"));
        Ok(FakeContext {
            id,
            url: url.to_string(),
            behavior,
            attempt: Arc::new(AtomicUsize::new(0)),
            driver: Arc::clone(&self.inner),
        })
    }
}

impl BrowsingContext for FakeContext {
    fn id(&self) -> &ContextId {
        &self.id
    }

    async fn wait_loaded(&self) -> Result<()> {
        let failed_load = self.driver.timing.lock().failed_load;
        if let Some(after) = failed_load {
            tokio::time::sleep(after).await;
            return Err(anyhow!("Page load timed out after {after:?}"));
        }
        Ok(())
    }

    async fn inject(&self, _script: &str) -> Result<()> {
        if matches!(self.behavior, Behavior::FailInject) {
            return Err(anyhow!("Execution context was destroyed"));
        }
        self.driver.log.push(format!("inject {}", self.id));
        Ok(())
    }

    async fn snapshot(&self) -> Result<PageSource> {
        self.driver.snapshots.fetch_add(1, Ordering::SeqCst);
        let delay = self.driver.timing.lock().snapshot;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            Behavior::Pages(pages) if !pages.is_empty() => {
                let attempt = self.attempt.fetch_add(1, Ordering::SeqCst);
                let html = &pages[attempt.min(pages.len() - 1)];
                Ok(PageSource::new(self.url.clone(), html.clone()))
            }
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Err(anyhow!("unreachable"))
            }
            _ => Err(anyhow!("no page")),
        }
    }

    async fn close(self) -> Result<()> {
        self.driver.log.push(format!("close {}", self.id));
        Ok(())
    }
}

pub fn settings(context_timeout_secs: u64) -> OrchestratorSettings {
    OrchestratorSettings {
        context_timeout: Duration::from_secs(context_timeout_secs),
        poll_interval: Duration::from_secs(1),
        currency: "INR".to_string(),
    }
}

pub fn orchestrator(driver: FakeDriver, context_timeout_secs: u64) -> TabOrchestrator<FakeDriver> {
    TabOrchestrator::new(driver, MessageBus::default(), settings(context_timeout_secs))
}

pub fn job(id: &str, url: Option<&str>) -> ScrapeJob {
    ScrapeJob::new(id, url.map(str::to_string), format!("comp-{id}"))
}

pub fn page(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>Hotel</title></head><body>{body}</body></html>")
}

pub fn booking_price_page(price: &str, room: &str) -> String {
    page(&format!(
        r#"<table id="hprt-table"><tbody><tr>
            <td><a class="hprt-roomtype-icon-link">{room}</a></td>
            <td>2 guests</td>
            <td><span data-testid="price-and-discounted-price">{price}</span></td>
        </tr></tbody></table>"#
    ))
}

pub fn booking_sold_out_page() -> String {
    page(r#"<div id="no_availability_msg"><p>This property has no availability on our site.</p></div>"#)
}

pub fn loading_page() -> String {
    page(r#"<div class="spinner">Loading prices</div>"#)
}

/// Runner that records start/end and fails or stalls on request
#[derive(Clone, Default)]
pub struct FakeRunner {
    pub log: EventLog,
    pub work: Duration,
    pub failing: Arc<Vec<String>>,
}

impl JobRunner for FakeRunner {
    async fn run_job(&self, job: &ScrapeJob) -> JobOutcome {
        self.log.push(format!("start {}", job.id));
        tokio::time::sleep(self.work).await;
        self.log.push(format!("end {}", job.id));
        if self.failing.contains(&job.id) {
            return Err(ScrapeError::InjectionFailed("scripted".to_string()));
        }
        Ok(vec![rate(&job.competitor_id, 1000.0)])
    }
}

pub fn rate(competitor_id: &str, price: f64) -> ScrapeResult {
    ScrapeResult {
        check_in_date: "2026-02-02".to_string(),
        price,
        room_type: "Deluxe".to_string(),
        is_sold_out: false,
        competitor_id: competitor_id.to_string(),
        currency: "INR".to_string(),
    }
}

/// Sink that keeps what it was given
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub batches: Arc<Mutex<Vec<(Vec<ScrapeResult>, Option<String>)>>>,
    pub log: EventLog,
}

impl RateSink for RecordingSink {
    async fn send(&self, rates: Vec<ScrapeResult>, token: Option<&str>) {
        self.log.push(format!("sink {}", rates.len()));
        self.batches.lock().push((rates, token.map(str::to_string)));
    }
}

/// Poll `condition` until it holds, letting paused time advance
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached");
}
