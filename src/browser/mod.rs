//! Browser seam
//!
//! The orchestrator only needs a handful of operations from a browser: open a
//! background context for a URL, load it, run a script in it, capture it and
//! close it. `BrowserDriver` and `BrowsingContext` name exactly
//! those; `cdp` implements them over chromiumoxide.

pub mod cdp;
pub mod manager;
pub mod setup;
pub mod stealth;
pub mod timeout;

pub use cdp::{CdpContext, CdpDriver};
pub use manager::{BrowserManager, BrowserWrapper};
pub use timeout::with_page_timeout;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::strategy::PageSource;

/// Identifier of one browsing context (a CDP target id for real browsers)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An open, isolated browsing context
///
/// Handles are cheap to clone; every clone drives the same context.
pub trait BrowsingContext: Clone + Send + Sync + 'static {
    fn id(&self) -> &ContextId;

    /// Navigate to the context's URL and resolve once the page finished loading
    fn wait_loaded(&self) -> impl Future<Output = Result<()>> + Send;

    /// Evaluate a script in the page
    fn inject(&self, script: &str) -> impl Future<Output = Result<()>> + Send;

    /// Capture the current page through the installed instrumentation
    fn snapshot(&self) -> impl Future<Output = Result<PageSource>> + Send;

    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Something that can open background browsing contexts
pub trait BrowserDriver: Send + Sync + 'static {
    type Context: BrowsingContext;

    /// Open a new context for `url` that does not take focus
    ///
    /// Navigation happens in `wait_loaded`, inside the caller's timeout.
    fn open_background(&self, url: &str) -> impl Future<Output = Result<Self::Context>> + Send;
}
