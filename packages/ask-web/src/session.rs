//! Per-user chat session: scrape a site, then ask about it.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{ExtractionError, Result};
use crate::pipeline::{store_writer, AnswerComposer, Chunker};
use crate::scrape::{FrontierBuilder, ImageTextExtractor, PageFetcher, ScrapeOrchestrator, ScrapeProgress};
use crate::security::UrlValidator;
use crate::stores::Collection;
use crate::traits::ai::Generator;
use crate::traits::browser::Browser;
use crate::traits::ocr::OcrEngine;
use crate::types::chat::{ChatReply, ConversationMessage};
use crate::types::chunk::CollectionStats;
use crate::types::config::{RetrievalConfig, ScrapeConfig};
use crate::types::page::PageRecord;

/// Prefix marking a transcript entry that came from speech.
pub const SPOKEN_PREFIX: &str = "🎤 ";

/// Outcome of [`ChatSession::scrape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeReport {
    pub url: String,
    pub pages: usize,
    pub images: usize,
    pub chunks_stored: usize,
    /// The site was already loaded; nothing was crawled or written
    pub cached: bool,
}

/// Assembles a [`ChatSession`].
pub struct SessionBuilder {
    browser: Arc<dyn Browser>,
    collection: Collection,
    generator: Arc<dyn Generator>,
    ocr: Option<Arc<dyn OcrEngine>>,
    scrape: ScrapeConfig,
    retrieval: RetrievalConfig,
}

impl SessionBuilder {
    /// OCR engine for page images. Without one, images are ignored.
    pub fn ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn scrape_config(mut self, config: ScrapeConfig) -> Self {
        self.scrape = config;
        self
    }

    pub fn retrieval_config(mut self, config: RetrievalConfig) -> Self {
        self.retrieval = config;
        self
    }

    pub fn build(self) -> ChatSession {
        let mut fetcher = PageFetcher::new(self.browser.clone(), &self.scrape);
        if let Some(ocr) = self.ocr {
            let mut images = ImageTextExtractor::new(ocr)
                .with_max_images(self.scrape.max_images)
                .with_timeout(self.scrape.image_timeout());
            if self.scrape.block_private_hosts {
                images = images.with_validator(UrlValidator::new());
            }
            fetcher = fetcher.with_images(images);
        }

        ChatSession {
            frontier: FrontierBuilder::new(self.browser, &self.scrape),
            orchestrator: ScrapeOrchestrator::new(Arc::new(fetcher), self.scrape.workers),
            composer: AnswerComposer::new(self.collection, self.generator).with_top_n(self.retrieval.top_n),
            chunker: Chunker::from_config(&self.retrieval),
            config: self.scrape,
            pages: Vec::new(),
            history: Vec::new(),
            last_report: None,
        }
    }
}

/// Scrape-then-chat state for one user.
///
/// Holds the pages of the current site, the conversation transcript and the
/// last scraped URL. Scraping a different site replaces the pages and starts
/// a fresh conversation.
pub struct ChatSession {
    config: ScrapeConfig,
    chunker: Chunker,
    frontier: FrontierBuilder,
    orchestrator: ScrapeOrchestrator,
    composer: AnswerComposer,
    pages: Vec<PageRecord>,
    history: Vec<ConversationMessage>,
    last_report: Option<ScrapeReport>,
}

impl ChatSession {
    pub fn builder(
        browser: Arc<dyn Browser>,
        collection: Collection,
        generator: Arc<dyn Generator>,
    ) -> SessionBuilder {
        SessionBuilder {
            browser,
            collection,
            generator,
            ocr: None,
            scrape: ScrapeConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }

    /// Crawl `url`, store its chunks and make it the session's site.
    pub async fn scrape(&mut self, url: &str) -> Result<ScrapeReport> {
        self.scrape_with_progress(url, None).await
    }

    /// [`scrape`](Self::scrape), reporting per-page progress on `progress`.
    pub async fn scrape_with_progress(
        &mut self,
        url: &str,
        progress: Option<mpsc::UnboundedSender<ScrapeProgress>>,
    ) -> Result<ScrapeReport> {
        let url = url.trim();
        if let Some(report) = self.cached_report(url) {
            info!(url = %url, pages = report.pages, "Site already loaded, reusing pages");
            return Ok(report);
        }

        let frontier = self.frontier.build(url, self.config.max_pages).await;
        let extract_images = self.config.extract_images;
        let pages = self.orchestrator.run(frontier, extract_images, progress).await;

        if pages.is_empty() {
            return Err(ExtractionError::NoContent { url: url.to_string() });
        }

        let collection = self.composer.collection();
        let chunks_stored = if self.config.replace_existing {
            store_writer::replace_pages(collection, &pages, url, &self.chunker).await?
        } else {
            store_writer::write_pages(collection, &pages, url, &self.chunker).await?
        };

        let report = ScrapeReport {
            url: url.to_string(),
            pages: pages.len(),
            images: pages.iter().map(|p| p.image_count).sum(),
            chunks_stored,
            cached: false,
        };

        self.pages = pages;
        self.history.clear();
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn cached_report(&self, url: &str) -> Option<ScrapeReport> {
        let last = self.last_report.as_ref()?;
        if last.url != url || self.pages.is_empty() {
            return None;
        }
        Some(ScrapeReport {
            cached: true,
            chunks_stored: 0,
            ..last.clone()
        })
    }

    /// Answer a typed question and record both sides in the transcript.
    pub async fn ask(&mut self, query: &str) -> ChatReply {
        self.respond(query, ConversationMessage::user(query)).await
    }

    /// Answer a transcribed question; the transcript entry is marked as spoken.
    pub async fn ask_spoken(&mut self, transcript: &str) -> ChatReply {
        let entry = ConversationMessage::user(format!("{}{}", SPOKEN_PREFIX, transcript));
        self.respond(transcript, entry).await
    }

    async fn respond(&mut self, query: &str, entry: ConversationMessage) -> ChatReply {
        self.history.push(entry);

        let reply = match self.composer.answer(query).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Retrieval failed");
                ChatReply::StorageUnavailable
            }
        };

        self.history.push(ConversationMessage::assistant(reply.text()));
        reply
    }

    /// Forget the conversation, keeping the loaded site.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_report.as_ref().map(|r| r.url.as_str())
    }

    pub async fn stats(&self) -> Result<CollectionStats> {
        self.composer.collection().stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::HashEmbedder;
    use crate::stores::MemoryStore;
    use crate::testing::{html_page, MockBrowser, MockGenerator};
    use crate::traits::store::VectorStore;
    use crate::types::chat::{Role, STORAGE_UNAVAILABLE};

    fn site() -> MockBrowser {
        let body = "Fresh bread every morning from our wood fired oven. ".repeat(6);
        MockBrowser::new()
            .with_page(
                "https://bakery.test",
                &format!(
                    r#"<html><head><title>Bakery</title></head><body><p>{}</p><a href="/about">About</a></body></html>"#,
                    body
                ),
            )
            .with_page("https://bakery.test/about", &html_page("About", &body))
    }

    fn session(browser: MockBrowser, generator: Arc<MockGenerator>) -> ChatSession {
        let collection = Collection::new(
            Arc::new(MemoryStore::new()),
            Arc::new(HashEmbedder::default()),
            "website_content",
        );
        ChatSession::builder(Arc::new(browser), collection, generator).build()
    }

    #[tokio::test]
    async fn test_scrape_then_ask() {
        let generator = Arc::new(MockGenerator::new("We bake at dawn."));
        let mut session = session(site(), generator.clone());

        let report = session.scrape("https://bakery.test").await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.chunks_stored, 2);
        assert!(!report.cached);
        assert_eq!(session.stats().await.unwrap().total_chunks, 2);

        let reply = session.ask("When is the bread baked?").await;
        assert_eq!(reply.text(), "We bake at dawn.");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, Role::User);
        assert_eq!(session.history()[1].content, "We bake at dawn.");
    }

    #[tokio::test]
    async fn test_rescrape_same_url_is_cached() {
        let browser = site();
        let mut session = session(browser.clone(), Arc::new(MockGenerator::new("ok")));

        session.scrape("https://bakery.test").await.unwrap();
        let opened = browser.opened_sessions();
        session.ask("hello?").await;

        let report = session.scrape("https://bakery.test").await.unwrap();
        assert!(report.cached);
        assert_eq!(report.pages, 2);
        assert_eq!(browser.opened_sessions(), opened);
        assert_eq!(session.history().len(), 2, "cached scrape keeps the conversation");
    }

    #[tokio::test]
    async fn test_new_site_clears_history() {
        let browser = site().with_page(
            "https://other.test",
            &html_page("Other", &"Another site with enough text to be kept. ".repeat(5)),
        );
        let mut session = session(browser, Arc::new(MockGenerator::new("ok")));

        session.scrape("https://bakery.test").await.unwrap();
        session.ask("first question").await;
        assert_eq!(session.history().len(), 2);

        session.scrape("https://other.test").await.unwrap();
        assert!(session.history().is_empty());
        assert_eq!(session.last_url(), Some("https://other.test"));
        assert_eq!(session.pages().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_scraped_is_no_content() {
        let browser = MockBrowser::new().with_failure("https://down.test");
        let mut session = session(browser, Arc::new(MockGenerator::new("ok")));

        let err = session.scrape("https://down.test").await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoContent { .. }));
        assert_eq!(session.last_url(), None);
    }

    #[tokio::test]
    async fn test_replace_existing_removes_old_chunks() {
        let collection = Collection::new(
            Arc::new(MemoryStore::new()),
            Arc::new(HashEmbedder::default()),
            "website_content",
        );
        let build = |replace: bool| {
            ChatSession::builder(Arc::new(site()), collection.clone(), Arc::new(MockGenerator::new("ok")))
                .scrape_config(ScrapeConfig::default().with_replace_existing(replace))
                .build()
        };

        build(false).scrape("https://bakery.test").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        build(false).scrape("https://bakery.test").await.unwrap();
        assert_eq!(collection.count().await.unwrap(), 4);

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        build(true).scrape("https://bakery.test").await.unwrap();
        assert_eq!(collection.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_chunks() {
        let store = Arc::new(MemoryStore::new());
        let stored = Collection::new(store.clone(), Arc::new(HashEmbedder::default()), "website_content");
        ChatSession::builder(Arc::new(site()), stored, Arc::new(MockGenerator::new("ok")))
            .build()
            .scrape("https://bakery.test")
            .await
            .unwrap();
        assert_eq!(store.count("website_content").await.unwrap(), 2);

        let outage = Collection::new(store.clone(), Arc::new(crate::testing::FailingEmbedder), "website_content");
        let mut session = ChatSession::builder(Arc::new(site()), outage, Arc::new(MockGenerator::new("ok")))
            .scrape_config(ScrapeConfig::default().with_replace_existing(true))
            .build();

        let err = session.scrape("https://bakery.test").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Embedding(_)));
        assert_eq!(store.count("website_content").await.unwrap(), 2);
        assert_eq!(session.last_url(), None);
    }

    #[tokio::test]
    async fn test_storage_errors_become_message() {
        let collection = Collection::new(
            Arc::new(crate::testing::FailingStore),
            Arc::new(HashEmbedder::default()),
            "website_content",
        );
        let mut session =
            ChatSession::builder(Arc::new(MockBrowser::new()), collection, Arc::new(MockGenerator::new("ok"))).build();

        let reply = session.ask("anything").await;
        assert_eq!(reply, ChatReply::StorageUnavailable);
        assert_eq!(session.history()[1].content, STORAGE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_spoken_questions_are_marked() {
        let mut session = session(site(), Arc::new(MockGenerator::new("ok")));
        session.ask_spoken("what do you sell").await;
        assert_eq!(session.history()[0].content, "🎤 what do you sell");

        session.clear();
        assert!(session.history().is_empty());
    }
}
