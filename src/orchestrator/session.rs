//! Per-job context session with guaranteed cleanup

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::{BrowsingContext, ContextId};
use crate::message_bus::ResultListener;
use crate::schema::{JobOutcome, ScrapeResult};

/// Owns one browsing context, its result listener and its engine task
///
/// `resolve` records the first outcome and runs cleanup; later outcomes are
/// discarded and the first one is returned again. Cleanup detaches the
/// listener, stops the engine and closes the context, once. A session dropped
/// without resolving (e.g. its future was cancelled) still closes its
/// context in the background.
pub struct ContextSession<C: BrowsingContext> {
    id: ContextId,
    context: Option<C>,
    listener: Option<ResultListener>,
    engine: Option<JoinHandle<ScrapeResult>>,
    resolution: Option<JobOutcome>,
}

impl<C: BrowsingContext> ContextSession<C> {
    #[must_use]
    pub fn new(context: C, listener: ResultListener) -> Self {
        Self {
            id: context.id().clone(),
            context: Some(context),
            listener: Some(listener),
            engine: None,
            resolution: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ContextId {
        &self.id
    }

    /// Context handle, until cleanup has run
    #[must_use]
    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    pub fn listener_mut(&mut self) -> Option<&mut ResultListener> {
        self.listener.as_mut()
    }

    pub fn attach_engine(&mut self, engine: JoinHandle<ScrapeResult>) {
        if let Some(previous) = self.engine.replace(engine) {
            previous.abort();
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Settle the session
    pub async fn resolve(&mut self, outcome: JobOutcome) -> JobOutcome {
        if let Some(first) = &self.resolution {
            debug!("Session {} already resolved, discarding later outcome", self.id);
            return first.clone();
        }
        self.resolution = Some(outcome.clone());
        self.cleanup().await;
        outcome
    }

    async fn cleanup(&mut self) {
        drop(self.listener.take());
        if let Some(engine) = self.engine.take() {
            engine.abort();
        }
        if let Some(context) = self.context.take() {
            match context.close().await {
                Ok(()) => debug!("Closed context {}", self.id),
                Err(e) => warn!("Failed to close context {}: {e:#}", self.id),
            }
        }
    }
}

impl<C: BrowsingContext> Drop for ContextSession<C> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.abort();
        }
        if let Some(context) = self.context.take() {
            let id = self.id.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    warn!("Session {id} dropped before resolving, closing context");
                    handle.spawn(async move {
                        if let Err(e) = context.close().await {
                            warn!("Failed to close abandoned context {id}: {e:#}");
                        }
                    });
                }
                Err(_) => warn!("Session {id} dropped outside a runtime, context left open"),
            }
        }
    }
}
