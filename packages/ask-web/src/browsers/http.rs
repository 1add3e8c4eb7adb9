//! Static HTML "browser" over reqwest.
//!
//! No JavaScript runs, so `wait_for` can only check the document as served.
//! Good enough for server-rendered sites and for every test in this crate.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::error::{CrawlError, CrawlResult};
use crate::traits::browser::{Browser, BrowserSession};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36 ask-web";

/// Browser backed by a shared HTTP client.
#[derive(Clone)]
pub struct HttpBrowser {
    client: reqwest::Client,
}

impl HttpBrowser {
    /// Create a browser with a 30 second request timeout.
    pub fn new() -> CrawlResult<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> CrawlResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| CrawlError::Http(Box::new(e)))?;

        Ok(Self { client })
    }

    /// Reuse an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_session(&self) -> CrawlResult<Box<dyn BrowserSession>> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            url: None,
            html: None,
        }))
    }

    fn name(&self) -> &str {
        "http"
    }
}

struct HttpSession {
    client: reqwest::Client,
    url: Option<String>,
    html: Option<String>,
}

impl HttpSession {
    fn loaded(&self) -> CrawlResult<&str> {
        self.html
            .as_deref()
            .ok_or_else(|| CrawlError::Browser("no page loaded".to_string()))
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> CrawlResult<()> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CrawlError::Timeout { url: url.to_string() }
                } else {
                    CrawlError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Http(
                format!("HTTP {} for {}", status, url).into(),
            ));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| CrawlError::Http(Box::new(e)))?;

        self.url = Some(final_url);
        self.html = Some(body);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> CrawlResult<()> {
        let parsed = Selector::parse(selector)
            .map_err(|e| CrawlError::Browser(format!("bad selector {}: {}", selector, e)))?;
        let html = self.loaded()?;
        let found = Html::parse_document(html).select(&parsed).next().is_some();

        if found {
            Ok(())
        } else {
            Err(CrawlError::Timeout {
                url: self.url.clone().unwrap_or_default(),
            })
        }
    }

    async fn html(&mut self) -> CrawlResult<String> {
        self.loaded().map(str::to_string)
    }

    async fn current_url(&mut self) -> CrawlResult<Option<String>> {
        Ok(self.url.clone())
    }

    async fn close(&mut self) -> CrawlResult<()> {
        self.html = None;
        self.url = None;
        Ok(())
    }
}
