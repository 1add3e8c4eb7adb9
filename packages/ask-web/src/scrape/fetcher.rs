//! Single page fetch and extraction.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::browsers::SessionGuard;
use crate::error::CrawlResult;
use crate::security::UrlValidator;
use crate::traits::browser::Browser;
use crate::types::config::ScrapeConfig;
use crate::types::page::PageRecord;
use crate::urls;

use super::html;
use super::images::ImageTextExtractor;

/// Separator between page text and recognised image text.
pub const IMAGE_TEXT_HEADER: &str = "\n\nText from Images:\n";

/// Turns one URL into a [`PageRecord`].
///
/// Every call opens its own browser session, so one fetcher can be shared by
/// any number of concurrent tasks.
#[derive(Clone)]
pub struct PageFetcher {
    browser: Arc<dyn Browser>,
    images: Option<ImageTextExtractor>,
    validator: Option<UrlValidator>,
    page_load_timeout: Duration,
    min_content_chars: usize,
}

impl PageFetcher {
    pub fn new(browser: Arc<dyn Browser>, config: &ScrapeConfig) -> Self {
        Self {
            browser,
            images: None,
            validator: config.block_private_hosts.then(UrlValidator::new),
            page_load_timeout: config.page_load_timeout(),
            min_content_chars: config.min_content_chars,
        }
    }

    /// Enable image OCR when callers ask for it.
    pub fn with_images(mut self, images: ImageTextExtractor) -> Self {
        self.images = Some(images);
        self
    }

    /// Fetch and extract a page.
    ///
    /// `Ok(None)` means the page loaded but carried too little text to keep.
    pub async fn fetch(&self, url: &str, extract_images: bool) -> CrawlResult<Option<PageRecord>> {
        let parsed = urls::validate_for_scraping(url)?;
        self.check_target(&parsed).await?;

        let mut guard = SessionGuard::open(self.browser.as_ref(), url).await?;
        let loaded = self.load(&mut guard, url).await;
        if let Err(e) = guard.close().await {
            debug!(url = %url, error = %e, "Session close failed after fetch");
        }
        let (rendered, final_url) = loaded?;

        // Redirects may have left the allowed hosts.
        let base = match final_url.as_deref().map(Url::parse) {
            Some(Ok(landed)) => {
                if landed != parsed {
                    debug!(url = %url, landed = %landed, "Page was redirected");
                    self.check_target(&landed).await?;
                }
                landed
            }
            _ => parsed,
        };

        let page = html::parse_page(&rendered);

        let image_lines = match (&self.images, extract_images) {
            (Some(images), true) => images.extract(&rendered, &base).await,
            _ => Vec::new(),
        };

        let mut content = page.text;
        if !image_lines.is_empty() {
            content.push_str(IMAGE_TEXT_HEADER);
            content.push_str(&image_lines.join("\n"));
        }

        if content.trim().chars().count() < self.min_content_chars {
            debug!(url = %url, chars = content.trim().chars().count(), "Page has too little text");
            return Ok(None);
        }

        Ok(Some(
            PageRecord::new(url, page.title.unwrap_or_default(), content)
                .with_image_count(image_lines.len()),
        ))
    }

    /// [`fetch`](Self::fetch), logging and swallowing failures.
    pub async fn fetch_or_skip(&self, url: &str, extract_images: bool) -> Option<PageRecord> {
        match self.fetch(url, extract_images).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to scrape page");
                None
            }
        }
    }

    async fn check_target(&self, url: &Url) -> CrawlResult<()> {
        if let Some(validator) = &self.validator {
            validator.check_resolved(url).await?;
        }
        Ok(())
    }

    async fn load(&self, guard: &mut SessionGuard, url: &str) -> CrawlResult<(String, Option<String>)> {
        guard.navigate(url).await?;
        guard.wait_for("body", self.page_load_timeout).await?;
        let rendered = guard.html().await?;
        let final_url = guard.current_url().await?;
        Ok((rendered, final_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlError;
    use crate::testing::{direct_client, html_page, serve_bytes, MockBrowser, MockOcr};

    fn fetcher(browser: MockBrowser) -> PageFetcher {
        PageFetcher::new(Arc::new(browser), &ScrapeConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_extracts_title_and_text() {
        let browser = MockBrowser::new().with_page(
            "https://ex.com/about",
            &html_page("About Us", &"We repair bicycles in town. ".repeat(10)),
        );
        let page = fetcher(browser.clone())
            .fetch("https://ex.com/about", false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(page.title, "About Us");
        assert!(page.content.starts_with("We repair bicycles"));
        assert_eq!(page.image_count, 0);
        assert_eq!(browser.closed_sessions(), browser.opened_sessions());
    }

    #[tokio::test]
    async fn test_short_pages_are_skipped() {
        let browser = MockBrowser::new().with_page("https://ex.com/", &html_page("Tiny", "Hi"));
        assert!(fetcher(browser).fetch("https://ex.com/", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_still_releases_session() {
        let browser = MockBrowser::new().with_failure("https://ex.com/broken");
        let result = fetcher(browser.clone()).fetch("https://ex.com/broken", false).await;

        assert!(result.is_err());
        assert_eq!(browser.opened_sessions(), 1);
        assert_eq!(browser.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_private_hosts_blocked_by_default() {
        let browser = MockBrowser::new().with_page("http://127.0.0.1/", &html_page("x", "y"));
        let err = fetcher(browser.clone()).fetch("http://127.0.0.1/", false).await.unwrap_err();
        assert!(matches!(err, CrawlError::Security(_)));
        assert_eq!(browser.opened_sessions(), 0);
    }

    #[tokio::test]
    async fn test_binary_urls_are_invalid() {
        let err = fetcher(MockBrowser::new())
            .fetch("https://ex.com/brochure.pdf", false)
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_fetch_or_skip_swallows_errors() {
        let browser = MockBrowser::new().with_failure("https://ex.com/broken");
        assert!(fetcher(browser).fetch_or_skip("https://ex.com/broken", true).await.is_none());
    }

    #[tokio::test]
    async fn test_redirect_to_metadata_host_is_refused() {
        let browser = MockBrowser::new()
            .with_redirect("https://public.example/", "http://169.254.169.254/latest/meta-data/")
            .with_page(
                "http://169.254.169.254/latest/meta-data/",
                &html_page("creds", &"secret-instance-credentials ".repeat(10)),
            );

        let err = fetcher(browser.clone())
            .fetch("https://public.example/", false)
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::Security(_)));
        assert_eq!(browser.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_same_site_redirect_is_kept() {
        let browser = MockBrowser::new()
            .with_redirect("https://ex.com/", "https://ex.com/en/")
            .with_page("https://ex.com/en/", &html_page("Home", &"Fresh bread daily. ".repeat(10)));

        let page = fetcher(browser)
            .fetch("https://ex.com/", false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(page.url, "https://ex.com/");
        assert!(page.content.starts_with("Fresh bread daily."));
    }

    #[tokio::test]
    async fn test_image_text_is_appended_under_header() {
        let image_host = serve_bytes(b"png bytes".to_vec()).await.unwrap();
        let html = format!(
            "<html><head><title>Shop</title></head><body><p>{}</p><img src=\"{}banner.png\"></body></html>",
            "Handmade shoes and boots. ".repeat(6),
            image_host
        );
        let browser = MockBrowser::new().with_page("https://shop.example/", &html);
        let ocr = Arc::new(MockOcr::new().with_text("  SALE 50%  "));
        let fetcher = PageFetcher::new(Arc::new(browser), &ScrapeConfig::default().allow_private_hosts())
            .with_images(ImageTextExtractor::new(ocr.clone()).with_client(direct_client()));

        let page = fetcher.fetch("https://shop.example/", true).await.unwrap().unwrap();

        assert!(page
            .content
            .ends_with(&format!("{}Image 1: SALE 50%", IMAGE_TEXT_HEADER)));
        assert_eq!(page.image_count, 1);
        assert_eq!(ocr.calls(), 1);
    }
}
