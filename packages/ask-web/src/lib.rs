//! Website Question-Answering Library
//!
//! Crawls a website, extracts its visible text (plus text read from its
//! images), stores the text as embedded chunks and answers questions about
//! it with a hosted language model grounded on the nearest chunks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ask_web::{ChatSession, Collection, HashEmbedder, HttpBrowser, MemoryStore};
//! use ask_web::ai::Gemini;
//!
//! let collection = Collection::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(HashEmbedder::default()),
//!     "website_content",
//! );
//! let mut session = ChatSession::builder(
//!     Arc::new(HttpBrowser::new()?),
//!     collection,
//!     Arc::new(Gemini::from_env()?),
//! )
//! .build();
//!
//! let report = session.scrape("https://example.com").await?;
//! let reply = session.ask("What does this company sell?").await;
//! println!("{}", reply.text());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability traits (Browser, OcrEngine, Generator, Embedder, VectorStore, speech)
//! - [`types`] - Pages, chunks, chat messages and configuration
//! - [`scrape`] - URL frontier, page fetcher, image OCR, bounded-concurrency orchestrator
//! - [`pipeline`] - Chunking, store writes, answer composition, voice
//! - [`session`] - Scrape-then-chat state for one user
//! - [`browsers`], [`ocr`], [`ai`], [`stores`] - Engine implementations
//! - [`security`] - API key handling and SSRF protection
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod browsers;
pub mod error;
pub mod ocr;
pub mod pipeline;
pub mod scrape;
pub mod security;
pub mod session;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;
pub mod urls;

pub use error::{CrawlError, ExtractionError, OcrError, SecurityError};
pub use traits::{
    ai::{Embedder, Generator},
    browser::{Browser, BrowserSession},
    ocr::OcrEngine,
    store::VectorStore,
    voice::{SpeechToText, TextToSpeech},
};
pub use types::{
    chat::{ChatReply, ConversationMessage, Role},
    chunk::{ChunkMetadata, CollectionStats, ContentChunk, SearchResult},
    config::{OcrBackend, RetrievalConfig, ScrapeConfig, StorageConfig},
    page::PageRecord,
};

pub use ai::{HashEmbedder, Provider};
pub use browsers::{BrowserKind, HttpBrowser, SessionGuard};
pub use pipeline::{AnswerComposer, Chunker, VoiceAssistant, VoiceReply};
pub use scrape::{FrontierBuilder, PageFetcher, ScrapeOrchestrator, ScrapeProgress};
pub use security::{ApiKey, UrlValidator};
pub use session::{ChatSession, ScrapeReport};
pub use stores::{Collection, MemoryStore};

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "chrome")]
pub use browsers::ChromeBrowser;
