//! Bounded-concurrency scraping of a URL list.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::types::page::PageRecord;

use super::fetcher::PageFetcher;

/// Progress after one URL finished (successfully or not).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeProgress {
    pub completed: usize,
    pub total: usize,
    pub url: String,
}

/// Runs one fetch task per URL, at most `workers` at a time.
#[derive(Clone)]
pub struct ScrapeOrchestrator {
    fetcher: Arc<PageFetcher>,
    workers: usize,
}

impl ScrapeOrchestrator {
    pub fn new(fetcher: Arc<PageFetcher>, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
        }
    }

    /// Scrape every URL and return the pages that yielded content, in
    /// completion order.
    ///
    /// A failed or panicked task is logged and contributes nothing. Progress
    /// is sent after every task if a channel is given; a closed channel is
    /// ignored.
    pub async fn run(
        &self,
        urls: Vec<String>,
        extract_images: bool,
        progress: Option<mpsc::UnboundedSender<ScrapeProgress>>,
    ) -> Vec<PageRecord> {
        let total = urls.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.workers.clamp(1, total);
        let semaphore = Arc::new(Semaphore::new(workers));
        info!(pages = total, workers, ocr = extract_images, "Scraping pages");

        let mut tasks = FuturesUnordered::new();
        for url in urls {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let task_url = url.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                fetcher.fetch_or_skip(&task_url, extract_images).await
            });
            tasks.push(async move { (url, handle.await) });
        }

        let mut pages = Vec::new();
        let mut completed = 0;
        while let Some((url, joined)) = tasks.next().await {
            completed += 1;
            match joined {
                Ok(Some(page)) => pages.push(page),
                Ok(None) => {}
                Err(e) => warn!(url = %url, error = %e, "Scrape task failed"),
            }

            info!(completed, total, url = %url, "Scrape progress");
            if let Some(tx) = &progress {
                let _ = tx.send(ScrapeProgress {
                    completed,
                    total,
                    url,
                });
            }
        }

        info!(scraped = pages.len(), total, "Scrape finished");
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{html_page, MockBrowser};
    use crate::types::config::ScrapeConfig;

    fn orchestrator(browser: MockBrowser, workers: usize) -> ScrapeOrchestrator {
        let fetcher = PageFetcher::new(Arc::new(browser), &ScrapeConfig::default());
        ScrapeOrchestrator::new(Arc::new(fetcher), workers)
    }

    fn body() -> String {
        "Plenty of readable words on this page for the scraper to keep. ".repeat(4)
    }

    #[tokio::test]
    async fn test_failures_are_dropped_and_progress_reported() {
        let browser = MockBrowser::new()
            .with_page("https://ex.com/1", &html_page("One", &body()))
            .with_failure("https://ex.com/2")
            .with_page("https://ex.com/3", &html_page("Three", &body()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let urls = vec![
            "https://ex.com/1".to_string(),
            "https://ex.com/2".to_string(),
            "https://ex.com/3".to_string(),
        ];
        let pages = orchestrator(browser.clone(), 3).run(urls, false, Some(tx)).await;

        let mut titles: Vec<_> = pages.iter().map(|p| p.title.as_str()).collect();
        titles.sort();
        assert_eq!(titles, vec!["One", "Three"]);

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        assert_eq!(updates.len(), 3);
        assert_eq!(
            updates.iter().map(|u| u.completed).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(updates.iter().all(|u| u.total == 3));
        assert_eq!(browser.closed_sessions(), 3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut browser = MockBrowser::new().with_delay(std::time::Duration::from_millis(20));
        let mut urls = Vec::new();
        for i in 0..8 {
            let url = format!("https://ex.com/p{}", i);
            browser = browser.with_page(&url, &html_page("P", &body()));
            urls.push(url);
        }

        let pages = orchestrator(browser.clone(), 2).run(urls, false, None).await;
        assert_eq!(pages.len(), 8);
        assert!(browser.max_concurrent_sessions() <= 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pages = orchestrator(MockBrowser::new(), 3).run(vec![], true, None).await;
        assert!(pages.is_empty());
    }
}
