//! Headless Chrome over the DevTools protocol.
//!
//! Each session launches its own browser process so concurrent fetches
//! share no cookies, cache or storage.

use async_trait::async_trait;
use chromiumoxide::{Browser as CdpBrowser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{CrawlError, CrawlResult};
use crate::traits::browser::{Browser, BrowserSession};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches a headless Chrome per session.
#[derive(Debug, Clone, Default)]
pub struct ChromeBrowser {
    no_sandbox: bool,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the Chrome sandbox (needed when running as root in containers).
    pub fn no_sandbox(mut self) -> Self {
        self.no_sandbox = true;
        self
    }
}

fn cdp_error(e: impl std::fmt::Display) -> CrawlError {
    CrawlError::Browser(e.to_string())
}

#[async_trait]
impl Browser for ChromeBrowser {
    async fn open_session(&self) -> CrawlResult<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder();
        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(CrawlError::Browser)?;

        let (browser, mut handler) = CdpBrowser::launch(config).await.map_err(cdp_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(cdp_error(e));
            }
        };

        debug!("Chrome session launched");
        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            page: Some(page),
            handler: Some(handler),
        }))
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

struct ChromeSession {
    browser: Option<CdpBrowser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl ChromeSession {
    fn page(&self) -> CrawlResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| CrawlError::Browser("session closed".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> CrawlResult<()> {
        self.page()?.goto(url).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> CrawlResult<()> {
        let page = self.page()?;
        let found = tokio::time::timeout(timeout, async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        match found {
            Ok(()) => Ok(()),
            Err(_) => {
                let url = page.url().await.ok().flatten().unwrap_or_default();
                Err(CrawlError::Timeout { url })
            }
        }
    }

    async fn html(&mut self) -> CrawlResult<String> {
        self.page()?.content().await.map_err(cdp_error)
    }

    async fn current_url(&mut self) -> CrawlResult<Option<String>> {
        self.page()?.url().await.map_err(cdp_error)
    }

    async fn close(&mut self) -> CrawlResult<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!(error = %e, "Failed to close Chrome page");
            }
        }
        let result = match self.browser.take() {
            Some(mut browser) => {
                let closed = browser.close().await.map(|_| ()).map_err(cdp_error);
                if let Err(e) = browser.wait().await {
                    warn!(error = %e, "Chrome process did not exit cleanly");
                }
                closed
            }
            None => Ok(()),
        };
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        result
    }
}
