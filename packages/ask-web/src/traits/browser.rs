//! Browser capability: isolated sessions that render a page to HTML.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CrawlResult;

/// Opens independent browser sessions.
///
/// Every session is isolated from every other; concurrent fetches each open
/// their own and never share one.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a fresh session.
    async fn open_session(&self) -> CrawlResult<Box<dyn BrowserSession>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// One browser session (a tab, or a whole headless process).
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` in this session.
    async fn navigate(&mut self, url: &str) -> CrawlResult<()>;

    /// Wait until an element matching `selector` exists, up to `timeout`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> CrawlResult<()>;

    /// Rendered HTML of the current page.
    async fn html(&mut self) -> CrawlResult<String>;

    /// URL after redirects, if a page is loaded.
    async fn current_url(&mut self) -> CrawlResult<Option<String>>;

    /// Release the session. Calling it twice is harmless.
    async fn close(&mut self) -> CrawlResult<()>;
}
