//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide), so the
//! search-page source can be driven by a scripted renderer in tests.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Number of currently open contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Block until an element matching `selector` is present, or fail after
    /// `timeout_ms`.
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A renderer used when Chromium is unavailable.
///
/// Every context request fails, so acquisition goes straight to the
/// fallback catalog.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("browser not available, HTTP-only mode"))
    }
    fn active_contexts(&self) -> usize {
        0
    }
}
