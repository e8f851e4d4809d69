//! chromiumoxide implementation of the browser seam

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use std::time::Duration;
use tracing::{debug, warn};

use super::stealth::STEALTH_SCRIPT;
use super::{BrowserDriver, BrowserManager, BrowsingContext, ContextId, with_page_timeout};
use crate::instrumentation::js_scripts::{INSTRUMENTATION_SCRIPT, SNAPSHOT_CALL};
use crate::strategy::PageSource;

/// Opens contexts as background tabs of the shared browser
#[derive(Clone)]
pub struct CdpDriver {
    manager: BrowserManager,
    page_load_timeout: Duration,
}

impl CdpDriver {
    #[must_use]
    pub fn new(manager: BrowserManager, page_load_timeout: Duration) -> Self {
        Self {
            manager,
            page_load_timeout,
        }
    }

    #[must_use]
    pub fn manager(&self) -> &BrowserManager {
        &self.manager
    }
}

impl BrowserDriver for CdpDriver {
    type Context = CdpContext;

    async fn open_background(&self, url: &str) -> Result<CdpContext> {
        // blank first so both scripts are registered before the site loads
        let page = self.manager.new_background_page("about:blank").await?;

        let context = CdpContext {
            id: ContextId::new(page.target_id().inner().clone()),
            page,
            url: url.to_string(),
            page_load_timeout: self.page_load_timeout,
        };

        let prepared = async {
            context
                .page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT.as_str()))
                .await
                .context("Failed to register stealth script")?;
            context
                .page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(INSTRUMENTATION_SCRIPT))
                .await
                .context("Failed to register instrumentation")?;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        if let Err(e) = prepared {
            if let Err(close_err) = context.page.clone().close().await {
                warn!("Failed to close half-opened context {}: {close_err}", context.id);
            }
            return Err(e);
        }

        debug!("Opened background context {} for {url}", context.id);
        Ok(context)
    }
}

/// One background tab
#[derive(Clone)]
pub struct CdpContext {
    id: ContextId,
    page: Page,
    url: String,
    page_load_timeout: Duration,
}

impl BrowsingContext for CdpContext {
    fn id(&self) -> &ContextId {
        &self.id
    }

    async fn wait_loaded(&self) -> Result<()> {
        with_page_timeout(
            async {
                self.page
                    .goto(self.url.as_str())
                    .await
                    .with_context(|| format!("Failed to navigate to {}", self.url))?;
                self.page
                    .wait_for_navigation()
                    .await
                    .context("Navigation failed")?;
                Ok(())
            },
            self.page_load_timeout,
            "Page load",
        )
        .await
    }

    async fn inject(&self, script: &str) -> Result<()> {
        self.page
            .evaluate(script)
            .await
            .context("Script evaluation failed")?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<PageSource> {
        self.page
            .evaluate(SNAPSHOT_CALL.as_str())
            .await
            .context("Snapshot evaluation failed")?
            .into_value::<PageSource>()
            .context("Snapshot returned an unexpected shape")
    }

    async fn close(self) -> Result<()> {
        self.page.close().await.context("Failed to close context")
    }
}
