//! Polling loop over a site strategy

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::{PageSnapshot, PageSource, SiteStrategy};
use crate::utils::TIMEOUT_ROOM_TYPE;

/// What one attempt observed
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub price: f64,
    pub room_type: String,
    pub is_sold_out: bool,
}

impl Observation {
    /// Reported when the attempt budget runs out without a terminal state
    #[must_use]
    pub fn exhausted() -> Self {
        Self {
            price: 0.0,
            room_type: TIMEOUT_ROOM_TYPE.to_string(),
            is_sold_out: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// Positive price or sold-out page; stop polling
    Terminal(Observation),
    /// Page not settled yet
    Pending,
}

/// Evaluate one snapshot. Sold-out detection wins over any price on the page.
#[must_use]
pub fn evaluate_attempt(strategy: &dyn SiteStrategy, page: &PageSnapshot) -> Attempt {
    if strategy.detect_sold_out(page) {
        return Attempt::Terminal(Observation {
            price: 0.0,
            room_type: strategy.extract_room_type(page),
            is_sold_out: true,
        });
    }

    match strategy.extract_price(page) {
        Some(price) if price > 0.0 => Attempt::Terminal(Observation {
            price,
            room_type: strategy.extract_room_type(page),
            is_sold_out: false,
        }),
        _ => Attempt::Pending,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollingPolicy {
    #[must_use]
    pub fn for_strategy(strategy: &dyn SiteStrategy, interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: strategy.max_attempts().max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub observation: Observation,
    /// URL of the last successful capture, if any
    pub final_url: Option<String>,
    pub attempts: u32,
    pub exhausted: bool,
}

/// Poll `capture` until the strategy sees a terminal state or the attempt
/// budget is spent
///
/// A failed capture counts as a pending attempt. The snapshot is parsed and
/// dropped inside each attempt, never held across the sleep.
pub async fn run_polling<F, Fut>(
    strategy: &'static dyn SiteStrategy,
    policy: PollingPolicy,
    mut capture: F,
) -> PollReport
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<PageSource>>,
{
    let mut final_url = None;

    for attempt in 1..=policy.max_attempts {
        match capture().await {
            Ok(source) => {
                let outcome = {
                    let page = PageSnapshot::parse(&source);
                    evaluate_attempt(strategy, &page)
                };
                final_url = Some(source.url);
                if let Attempt::Terminal(observation) = outcome {
                    debug!(
                        "{} strategy settled on attempt {attempt}/{}",
                        strategy.name(),
                        policy.max_attempts
                    );
                    return PollReport {
                        observation,
                        final_url,
                        attempts: attempt,
                        exhausted: false,
                    };
                }
            }
            Err(e) => {
                debug!("Capture failed on attempt {attempt}: {e:#}");
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    warn!(
        "{} strategy found no price after {} attempts, reporting sold out",
        strategy.name(),
        policy.max_attempts
    );
    PollReport {
        observation: Observation::exhausted(),
        final_url,
        attempts: policy.max_attempts,
        exhausted: true,
    }
}
