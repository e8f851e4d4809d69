//! JavaScript injected into pages
//!
//! `INSTRUMENTATION_SCRIPT` is registered for every new document of a job's
//! context and evaluated again once it has loaded; every polling attempt
//! then calls `SNAPSHOT_CALL`. The trigger script is served to caller pages
//! so they can post `START_SCRAPE` to the host from inside the browser.

use once_cell::sync::Lazy;

/// Installs `window.__rateScrape` in the page
///
/// `snapshot()` tags every element that is not rendered with
/// `data-rs-hidden` (clearing stale tags first) and returns
/// `{ url, html, text }`.
pub const INSTRUMENTATION_SCRIPT: &str = r#"
    (() => {
        if (window.__rateScrape) {
            return true;
        }
        const MARK = 'data-rs-hidden';

        const isHidden = (el) => {
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
                return true;
            }
            return !(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
        };

        window.__rateScrape = {
            snapshot: () => {
                document.querySelectorAll('[' + MARK + ']').forEach(el => el.removeAttribute(MARK));
                if (document.body) {
                    document.body.querySelectorAll('*').forEach(el => {
                        if (el.parentElement && el.parentElement.hasAttribute(MARK)) {
                            return;
                        }
                        if (isHidden(el)) {
                            el.setAttribute(MARK, '1');
                        }
                    });
                }
                return {
                    url: window.location.href,
                    html: document.documentElement.outerHTML,
                    text: document.body ? document.body.innerText : ''
                };
            }
        };
        return true;
    })()
"#;

/// Expression evaluated on every polling attempt
///
/// Reinstalls the instrumentation first, so a redirect or reload that
/// replaced the document after injection does not blind the engine.
pub static SNAPSHOT_CALL: Lazy<String> = Lazy::new(|| {
    format!(
        "(() => {{\n    {};\n    return window.__rateScrape.snapshot();\n}})()",
        INSTRUMENTATION_SCRIPT.trim()
    )
});

/// Placeholder replaced with the listener's message endpoint
const ENDPOINT_PLACEHOLDER: &str = "__RATESCRAPE_ENDPOINT__";

const TRIGGER_TEMPLATE: &str = r#"
    (() => {
        if (window.__rateScrapeTrigger) {
            return;
        }
        window.__rateScrapeTrigger = true;
        window.addEventListener('message', (event) => {
            if (event.source !== window || !event.data || event.data.type !== 'START_SCRAPE') {
                return;
            }
            fetch('__RATESCRAPE_ENDPOINT__', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(event.data)
            })
                .then(response => response.json())
                .then(ack => window.postMessage({ type: 'START_SCRAPE_ACK', ack }, '*'))
                .catch(error => console.warn('ratescrape trigger failed', error));
        });
    })();
"#;

/// Trigger script for caller pages, posting to `endpoint`
///
/// The page signals with `window.postMessage({ type: 'START_SCRAPE', jobs,
/// token }, '*')` and receives `START_SCRAPE_ACK` with the acknowledgment.
#[must_use]
pub fn trigger_script(endpoint: &str) -> String {
    let escaped = endpoint.replace('\\', "\\\\").replace('\'', "\\'");
    TRIGGER_TEMPLATE.replace(ENDPOINT_PLACEHOLDER, &escaped)
}
