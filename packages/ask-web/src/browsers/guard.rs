//! Scoped browser session.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CrawlError, CrawlResult};
use crate::traits::browser::{Browser, BrowserSession};

/// Owns one browser session and guarantees it is released.
///
/// Prefer [`SessionGuard::close`], which awaits the release and reports
/// failures. If the guard is dropped without it (an early `?` return, a
/// panic in the task) the close is spawned on the runtime that opened the
/// session.
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
    label: String,
    runtime_handle: Option<tokio::runtime::Handle>,
}

impl SessionGuard {
    /// Open a session on `browser`. `label` is used in logs only.
    pub async fn open(browser: &dyn Browser, label: impl Into<String>) -> CrawlResult<Self> {
        let session = browser.open_session().await?;
        Ok(Self::new(session, label))
    }

    /// Wrap an already opened session.
    pub fn new(session: Box<dyn BrowserSession>, label: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            label: label.into(),
            runtime_handle: tokio::runtime::Handle::try_current().ok(),
        }
    }

    fn session(&mut self) -> CrawlResult<&mut Box<dyn BrowserSession>> {
        self.session
            .as_mut()
            .ok_or_else(|| CrawlError::Browser("session already closed".to_string()))
    }

    pub async fn navigate(&mut self, url: &str) -> CrawlResult<()> {
        self.session()?.navigate(url).await
    }

    pub async fn wait_for(&mut self, selector: &str, timeout: Duration) -> CrawlResult<()> {
        self.session()?.wait_for(selector, timeout).await
    }

    pub async fn html(&mut self) -> CrawlResult<String> {
        self.session()?.html().await
    }

    pub async fn current_url(&mut self) -> CrawlResult<Option<String>> {
        self.session()?.current_url().await
    }

    /// Close the session, consuming the guard.
    pub async fn close(mut self) -> CrawlResult<()> {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!(label = %self.label, error = %e, "Failed to close browser session");
                return Err(e);
            }
            debug!(label = %self.label, "Browser session closed");
        }
        Ok(())
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let label = std::mem::take(&mut self.label);

        match &self.runtime_handle {
            Some(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!(label = %label, error = %e, "Browser session cleanup failed");
                    } else {
                        debug!(label = %label, "Browser session cleaned up on drop");
                    }
                });
            }
            None => {
                warn!(label = %label, "Browser session dropped outside a runtime");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBrowser;

    #[tokio::test]
    async fn test_explicit_close_releases_session() {
        let browser = MockBrowser::new().with_page("https://ex.com", "<html><body>hi</body></html>");
        let mut guard = SessionGuard::open(&browser, "test").await.unwrap();
        guard.navigate("https://ex.com").await.unwrap();
        assert!(guard.html().await.unwrap().contains("hi"));
        guard.close().await.unwrap();

        assert_eq!(browser.opened_sessions(), 1);
        assert_eq!(browser.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_drop_spawns_close() {
        let browser = MockBrowser::new();
        {
            let _guard = SessionGuard::open(&browser, "dropped").await.unwrap();
        }
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(browser.closed_sessions(), 1);
    }
}
