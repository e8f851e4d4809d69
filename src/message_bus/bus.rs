//! Result bus between engine tasks and waiting sessions
//!
//! Every `SCRAPE_RESULT` goes out on one broadcast channel. A session listens
//! for its own context id only and skips everything else.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::errors::BusError;
use super::metrics::BusMetrics;
use super::types::ScrapeResultMessage;
use crate::browser::ContextId;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct MessageBus {
    sender: broadcast::Sender<ScrapeResultMessage>,
    metrics: BusMetrics,
}

impl MessageBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            metrics: BusMetrics::new(),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &BusMetrics {
        &self.metrics
    }

    /// Publish a context's results to every listener
    ///
    /// Returns the number of listeners reached.
    pub fn publish(&self, message: ScrapeResultMessage) -> Result<usize, BusError> {
        let context_id = message.context_id.clone();
        match self.sender.send(message) {
            Ok(listeners) => {
                self.metrics.increment_published();
                log::debug!("Published SCRAPE_RESULT for {context_id} to {listeners} listener(s)");
                Ok(listeners)
            }
            Err(_) => {
                self.metrics.increment_dropped();
                log::debug!("SCRAPE_RESULT for {context_id} dropped, nobody listening");
                Err(BusError::NoSubscribers)
            }
        }
    }

    /// Listen for results from one context
    ///
    /// Only messages published after this call are seen, so register before
    /// anything in the context can report.
    #[must_use]
    pub fn listen(&self, context_id: ContextId) -> ResultListener {
        ResultListener {
            receiver: self.sender.subscribe(),
            context_id,
            metrics: self.metrics.clone(),
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One-shot receiver scoped to a single context id
///
/// Dropping it detaches it from the bus.
#[derive(Debug)]
pub struct ResultListener {
    receiver: broadcast::Receiver<ScrapeResultMessage>,
    context_id: ContextId,
    metrics: BusMetrics,
}

impl ResultListener {
    #[must_use]
    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    /// Wait for the next message from this listener's context
    pub async fn recv(&mut self) -> Result<ScrapeResultMessage, BusError> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message.context_id == self.context_id => return Ok(message),
                Ok(message) => {
                    self.metrics.increment_ignored_foreign();
                    debug!(
                        "Listener for {} ignored result from {}",
                        self.context_id, message.context_id
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("{}", BusError::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return Err(BusError::Closed),
            }
        }
    }
}
