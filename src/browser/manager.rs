//! Shared browser lifecycle
//!
//! One browser process serves every job. It is launched on first use,
//! health-checked before each reuse and relaunched after a crash.

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::setup::launch_browser;

/// Browser plus its CDP handler task
///
/// The handler is aborted on drop. A profile directory the wrapper created
/// itself is removed on cleanup; a configured one is left alone.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    temp_profile: Option<PathBuf>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, temp_profile: Option<PathBuf>) -> Self {
        Self {
            browser,
            handler,
            temp_profile,
        }
    }

    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Close the process and wait for it to exit, then drop the temp profile
    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {e}");
        }
        self.cleanup_temp_profile();
    }

    fn cleanup_temp_profile(&mut self) {
        if let Some(path) = self.temp_profile.take() {
            debug!("Removing temp profile {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!("Failed to remove temp profile {}: {e}", path.display());
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
        if self.temp_profile.is_some() {
            warn!("BrowserWrapper dropped without shutdown, removing temp profile");
            self.cleanup_temp_profile();
        }
    }
}

/// Lazily launched, self-healing shared browser
#[derive(Clone)]
pub struct BrowserManager {
    browser: Arc<Mutex<Option<BrowserWrapper>>>,
    headless: bool,
    chrome_data_dir: Option<PathBuf>,
}

impl BrowserManager {
    /// Nothing is launched until the first page is requested
    #[must_use]
    pub fn new(headless: bool, chrome_data_dir: Option<PathBuf>) -> Self {
        Self {
            browser: Arc::new(Mutex::new(None)),
            headless,
            chrome_data_dir,
        }
    }

    /// Open a new page that does not take focus
    ///
    /// Launches the browser on first use. A browser that fails its
    /// `version()` health check is torn down and replaced first.
    pub async fn new_background_page(&self, url: &str) -> Result<Page> {
        let mut guard = self.browser.lock().await;

        if let Some(wrapper) = guard.as_ref()
            && let Err(e) = wrapper.browser().version().await
        {
            warn!("Browser health check failed: {e}. Relaunching");
            if let Some(crashed) = guard.take() {
                crashed.shutdown().await;
            }
        }

        if guard.is_none() {
            info!("Launching shared browser");
            let (browser, handler, user_data_dir) =
                launch_browser(self.headless, self.chrome_data_dir.clone()).await?;
            let temp_profile = self.chrome_data_dir.is_none().then_some(user_data_dir);
            *guard = Some(BrowserWrapper::new(browser, handler, temp_profile));
        }

        let wrapper = guard
            .as_ref()
            .context("Browser unavailable after launch")?;

        let mut params = CreateTargetParams::new(url);
        params.background = Some(true);
        wrapper
            .browser()
            .new_page(params)
            .await
            .with_context(|| format!("Failed to open background page for {url}"))
    }

    /// Whether a browser process is currently held
    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }

    /// Close the browser if one is running. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let wrapper = self.browser.lock().await.take();
        if let Some(wrapper) = wrapper {
            info!("Shutting down shared browser");
            wrapper.shutdown().await;
        }
    }
}
