//! Testing utilities including mock implementations.
//!
//! These let applications (and this crate's own tests) drive the scrape and
//! chat pipeline without a browser, OCR engine, model or speech service.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{CrawlError, CrawlResult, ExtractionError, OcrError, OcrResult, Result};
use crate::traits::ai::{Embedder, Generator};
use crate::traits::browser::{Browser, BrowserSession};
use crate::traits::ocr::OcrEngine;
use crate::traits::store::VectorStore;
use crate::traits::voice::{SpeechToText, TextToSpeech};
use crate::types::chunk::{ChunkMetadata, ContentChunk, EmbeddedChunk, SearchResult};
use crate::urls;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn page_key(url: &str) -> String {
    urls::normalize(url).unwrap_or_else(|_| url.trim().to_string())
}

/// Minimal HTML document with a title and one paragraph.
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><p>{}</p></body></html>",
        title, body
    )
}

fn metadata(website: &str) -> ChunkMetadata {
    ChunkMetadata {
        url: website.to_string(),
        title: "Test Page".to_string(),
        website: website.to_string(),
        chunk_index: 0,
        image_count: 0,
        timestamp: Utc::now(),
    }
}

/// A chunk with the given id and text.
pub fn content_chunk(id: &str, website: &str, text: &str) -> ContentChunk {
    ContentChunk {
        document_id: id.to_string(),
        text: text.to_string(),
        metadata: metadata(website),
    }
}

/// A pre-embedded chunk whose text is `"{id} text"`.
pub fn embedded_chunk(id: &str, website: &str, embedding: Vec<f32>) -> EmbeddedChunk {
    EmbeddedChunk {
        chunk: content_chunk(id, website, &format!("{} text", id)),
        embedding,
    }
}

/// A search hit with the given page title.
pub fn search_result(text: &str, title: &str, distance: f32) -> SearchResult {
    let mut metadata = metadata("https://example.test");
    metadata.title = title.to_string();
    SearchResult {
        text: text.to_string(),
        metadata,
        distance,
    }
}

/// Serve `body` to every request on a local port, forever.
///
/// Returns the server's base URL, e.g. `http://127.0.0.1:40123/`.
pub async fn serve_bytes(body: Vec<u8>) -> std::io::Result<String> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let body = Arc::new(body);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Ok(format!("http://{}/", addr))
}

/// An HTTP client that ignores proxy settings, for talking to [`serve_bytes`].
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_default()
}

// =============================================================================
// Browser
// =============================================================================

#[derive(Default)]
struct BrowserState {
    pages: HashMap<String, String>,
    failures: HashSet<String>,
    redirects: HashMap<String, String>,
    navigations: Vec<String>,
}

#[derive(Default)]
struct SessionCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// A browser serving canned HTML by URL.
///
/// URLs are matched after normalization. Unknown URLs fail like a 404;
/// URLs registered with [`with_failure`](Self::with_failure) fail like a
/// crashed page load. Clones share state, so a test can keep one handle and
/// inspect session counts after handing another to the pipeline.
#[derive(Clone, Default)]
pub struct MockBrowser {
    state: Arc<Mutex<BrowserState>>,
    counters: Arc<SessionCounters>,
    delay: Option<Duration>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`.
    pub fn with_page(self, url: &str, html: &str) -> Self {
        lock(&self.state).pages.insert(page_key(url), html.to_string());
        self
    }

    /// Make loading `url` fail.
    pub fn with_failure(self, url: &str) -> Self {
        lock(&self.state).failures.insert(page_key(url));
        self
    }

    /// Send navigations to `from` on to `to`, which then serves the page
    /// registered for `to` and reports `to` as the current URL.
    pub fn with_redirect(self, from: &str, to: &str) -> Self {
        lock(&self.state).redirects.insert(page_key(from), to.to_string());
        self
    }

    /// Sleep this long in every navigation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn opened_sessions(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed_sessions(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Most sessions that were open at the same time.
    pub fn max_concurrent_sessions(&self) -> usize {
        self.counters.max_active.load(Ordering::SeqCst)
    }

    /// Every URL navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.state).navigations.clone()
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn open_session(&self) -> CrawlResult<Box<dyn BrowserSession>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            browser: self.clone(),
            url: None,
            html: None,
            closed: false,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockSession {
    browser: MockBrowser,
    url: Option<String>,
    html: Option<String>,
    closed: bool,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> CrawlResult<()> {
        if let Some(delay) = self.browser.delay {
            tokio::time::sleep(delay).await;
        }

        let (landed, page) = {
            let mut state = lock(&self.browser.state);
            state.navigations.push(url.to_string());
            let landed = state
                .redirects
                .get(&page_key(url))
                .cloned()
                .unwrap_or_else(|| url.to_string());
            let key = page_key(&landed);
            if state.failures.contains(&key) {
                return Err(CrawlError::Browser(format!("page crashed: {}", landed)));
            }
            (landed, state.pages.get(&key).cloned())
        };

        let html = page.ok_or_else(|| CrawlError::Http(format!("HTTP 404 for {}", landed).into()))?;
        self.url = Some(landed);
        self.html = Some(html);
        Ok(())
    }

    async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> CrawlResult<()> {
        match self.html {
            Some(_) => Ok(()),
            None => Err(CrawlError::Timeout {
                url: self.url.clone().unwrap_or_default(),
            }),
        }
    }

    async fn html(&mut self) -> CrawlResult<String> {
        self.html
            .clone()
            .ok_or_else(|| CrawlError::Browser("no page loaded".to_string()))
    }

    async fn current_url(&mut self) -> CrawlResult<Option<String>> {
        Ok(self.url.clone())
    }

    async fn close(&mut self) -> CrawlResult<()> {
        if !self.closed {
            self.closed = true;
            self.browser.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.browser.counters.active.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

// =============================================================================
// Generation
// =============================================================================

/// A generator returning a fixed answer (or a fixed error) and recording prompts.
pub struct MockGenerator {
    response: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        lock(&self.prompts).last().cloned()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        lock(&self.prompts).push(prompt.to_string());
        self.response
            .clone()
            .map_err(|message| ExtractionError::AI(message.into()))
    }

    fn model(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// OCR
// =============================================================================

/// OCR returning the same text for every image.
#[derive(Default)]
pub struct MockOcr {
    text: String,
    calls: AtomicUsize,
}

impl MockOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn recognize(&self, image: &[u8]) -> OcrResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if image.is_empty() {
            return Err(OcrError::Recognition("empty image".to_string()));
        }
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Speech
// =============================================================================

/// Speech-to-text and text-to-speech with canned results.
#[derive(Default)]
pub struct MockSpeech {
    transcript: String,
    transcription_error: Option<String>,
    synthesis_error: Option<String>,
    spoken: Mutex<Vec<String>>,
}

impl MockSpeech {
    /// Bytes returned by every successful synthesis.
    pub const AUDIO: &'static [u8] = b"ID3mock-mp3";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = transcript.into();
        self
    }

    pub fn failing_transcription(mut self, message: impl Into<String>) -> Self {
        self.transcription_error = Some(message.into());
        self
    }

    pub fn failing_synthesis(mut self, message: impl Into<String>) -> Self {
        self.synthesis_error = Some(message.into());
        self
    }

    /// Texts passed to `synthesize`.
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.spoken).clone()
    }
}

#[async_trait]
impl SpeechToText for MockSpeech {
    async fn transcribe(&self, _audio: &[u8], _file_name: &str) -> Result<String> {
        match &self.transcription_error {
            Some(message) => Err(ExtractionError::AI(message.clone().into())),
            None => Ok(self.transcript.clone()),
        }
    }
}

#[async_trait]
impl TextToSpeech for MockSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if let Some(message) = &self.synthesis_error {
            return Err(ExtractionError::AI(message.clone().into()));
        }
        lock(&self.spoken).push(text.to_string());
        Ok(Self::AUDIO.to_vec())
    }
}

// =============================================================================
// Store
// =============================================================================

/// A vector store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn add(&self, _collection: &str, _records: Vec<EmbeddedChunk>) -> Result<()> {
        Err(ExtractionError::Storage("store offline".into()))
    }

    async fn query(&self, _collection: &str, _embedding: &[f32], _n: usize) -> Result<Vec<SearchResult>> {
        Err(ExtractionError::Storage("store offline".into()))
    }

    async fn count(&self, _collection: &str) -> Result<usize> {
        Err(ExtractionError::Storage("store offline".into()))
    }

    async fn delete_website(&self, _collection: &str, _website: &str) -> Result<usize> {
        Err(ExtractionError::Storage("store offline".into()))
    }

    async fn replace_website(
        &self,
        _collection: &str,
        _website: &str,
        _records: Vec<EmbeddedChunk>,
    ) -> Result<usize> {
        Err(ExtractionError::Storage("store offline".into()))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Err(ExtractionError::Storage("store offline".into()))
    }
}

/// An embedder whose provider is down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(ExtractionError::Embedding("embedding service unavailable".to_string()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}
