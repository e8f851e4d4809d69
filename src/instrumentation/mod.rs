//! In-context engine host
//!
//! Once a context has its instrumentation installed, an engine task polls it
//! through the site strategy and reports exactly one `SCRAPE_RESULT` for the
//! context on the message bus.

pub mod js_scripts;

pub use js_scripts::{INSTRUMENTATION_SCRIPT, SNAPSHOT_CALL, trigger_script};

use chrono::Local;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::browser::BrowsingContext;
use crate::message_bus::{MessageBus, ScrapeResultMessage};
use crate::schema::ScrapeResult;
use crate::strategy::{PollingPolicy, Site, resolve_check_in_date, run_polling};

/// What the engine needs to know about the job it serves
#[derive(Debug, Clone)]
pub struct EngineTask {
    pub competitor_id: String,
    /// Normalized URL the context was opened on
    pub url: String,
    pub poll_interval: Duration,
    pub currency: String,
}

/// Poll a context to a terminal result and publish it
///
/// Returns the result that was published.
pub async fn run_engine<C: BrowsingContext>(
    context: C,
    task: EngineTask,
    bus: MessageBus,
) -> ScrapeResult {
    let site = Site::from_url(&task.url);
    let strategy = site.strategy();
    let policy = PollingPolicy::for_strategy(strategy, task.poll_interval);
    debug!(
        "Engine for {} using {} strategy ({} attempts)",
        context.id(),
        strategy.name(),
        policy.max_attempts
    );

    let report = run_polling(strategy, policy, || {
        let context = context.clone();
        async move { context.snapshot().await }
    })
    .await;

    let page_url = report.final_url.as_deref().unwrap_or(&task.url);
    let result = ScrapeResult {
        check_in_date: resolve_check_in_date(page_url, Local::now().date_naive()),
        price: report.observation.price,
        room_type: report.observation.room_type,
        is_sold_out: report.observation.is_sold_out,
        competitor_id: task.competitor_id,
        currency: task.currency,
    };

    info!(
        "Context {} settled after {} attempt(s): price {} sold_out {}",
        context.id(),
        report.attempts,
        result.price,
        result.is_sold_out
    );

    let message = ScrapeResultMessage {
        context_id: context.id().clone(),
        results: vec![result.clone()],
    };
    if let Err(e) = bus.publish(message) {
        debug!("Result for {} not delivered: {e}", context.id());
    }
    result
}

/// Run the engine for a context in the background
pub fn spawn_engine<C: BrowsingContext>(
    context: C,
    task: EngineTask,
    bus: MessageBus,
) -> JoinHandle<ScrapeResult> {
    tokio::spawn(run_engine(context, task, bus))
}
