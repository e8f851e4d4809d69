//! Anti-automation evasions
//!
//! Registered with `Page.addScriptToEvaluateOnNewDocument` before the first
//! navigation, so it runs ahead of any site script in every document the
//! context loads.

use once_cell::sync::Lazy;

use crate::utils::CHROME_USER_AGENT;

/// Combined evasion script for a fresh context
pub static STEALTH_SCRIPT: Lazy<String> = Lazy::new(|| {
    format!(
        r"(() => {{
    Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
    Object.defineProperty(navigator, 'userAgent', {{ get: () => '{CHROME_USER_AGENT}' }});
    Object.defineProperty(navigator, 'languages', {{ get: () => ['en-US', 'en'] }});

    const mockPlugins = [
        {{ name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format' }},
        {{ name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: '' }},
        {{ name: 'Native Client', filename: 'internal-nacl-plugin', description: '' }}
    ];
    const pluginsProto = Object.getPrototypeOf(navigator.plugins);
    Object.defineProperty(navigator, 'plugins', {{
        get: () => {{
            const plugins = {{}};
            mockPlugins.forEach((plugin, i) => {{
                plugins[i] = plugin;
                plugins[plugin.name] = plugin;
            }});
            Object.setPrototypeOf(plugins, pluginsProto);
            Object.defineProperty(plugins, 'length', {{ value: mockPlugins.length }});
            return plugins;
        }}
    }});

    if (!window.chrome) {{
        window.chrome = {{}};
    }}
    if (!window.chrome.runtime) {{
        window.chrome.runtime = {{
            connect: () => ({{
                onMessage: {{ addListener: () => {{}}, removeListener: () => {{}} }},
                postMessage: () => {{}}
            }})
        }};
    }}

    if (window.WebGLRenderingContext) {{
        const getParameter = WebGLRenderingContext.prototype.getParameter;
        WebGLRenderingContext.prototype.getParameter = new Proxy(getParameter, {{
            apply(target, ctx, args) {{
                const param = args && args[0];
                // UNMASKED_VENDOR_WEBGL / UNMASKED_RENDERER_WEBGL
                if (param === 37445) return 'Intel Inc.';
                if (param === 37446) return 'Intel Iris OpenGL Engine';
                return Reflect.apply(target, ctx, args);
            }}
        }});
    }}
}})();"
    )
});
