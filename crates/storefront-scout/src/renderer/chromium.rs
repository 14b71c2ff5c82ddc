//! Chromium-based renderer using chromiumoxide.

use super::{RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. SCOUT_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("SCOUT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.storefront-scout/chromium/
    if let Some(home) = dirs::home_dir() {
        let base = home.join(".storefront-scout/chromium");
        let candidates = if cfg!(target_os = "macos") {
            vec![
                base.join("chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome"),
            ]
        } else {
            vec![base.join("chrome-linux64/chrome"), base.join("chrome")]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
///
/// The browser process is relaunched when it stops handing out pages, so a
/// crash during one attempt does not doom the next.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn new() -> Result<Self> {
        Ok(Self {
            browser: Mutex::new(launch().await?),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

async fn launch() -> Result<Browser> {
    let chrome_path = find_chromium()
        .context("Chromium not found. Set SCOUT_CHROMIUM_PATH or install Chrome.")?;

    let config = BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .arg("--headless=new")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={USER_AGENT}"))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("failed to launch Chromium")?;

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            let _ = event;
        }
    });

    Ok(browser)
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let mut browser = self.browser.lock().await;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                warn!("browser unresponsive ({e}); relaunching Chromium");
                let mut stale = std::mem::replace(&mut *browser, launch().await?);
                if let Some(Err(e)) = stale.kill().await {
                    debug!("failed to kill stale browser: {e}");
                }
                browser
                    .new_page("about:blank")
                    .await
                    .context("failed to create new page")?
            }
        };

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

/// Script that resolves once `selector` matches, watching DOM mutations
/// rather than polling.
fn presence_script(selector: &str) -> Result<String> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        r#"new Promise((resolve) => {{
            const sel = {selector};
            if (document.querySelector(sel)) return resolve(true);
            const observer = new MutationObserver(() => {{
                if (document.querySelector(sel)) {{
                    observer.disconnect();
                    resolve(true);
                }}
            }});
            observer.observe(document.documentElement, {{ childList: true, subtree: true }});
        }})"#
    ))
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let script = presence_script(selector)?;
        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.evaluate(script))
                .await;

        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => bail!("waiting for {selector} failed: {e}"),
            Err(_) => bail!("timed out after {timeout_ms}ms waiting for {selector}"),
        }
    }

    async fn get_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;

        Ok(html)
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        self.page.close().await.context("failed to close page")?;
        Ok(())
    }
}
