//! Configuration types for scraping, storage and retrieval.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default collection grouping chunks from every scraped site.
pub const DEFAULT_COLLECTION: &str = "website_content";

/// Configuration for a scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Maximum number of pages in the frontier (seed included)
    pub max_pages: usize,

    /// Maximum concurrent fetches, each with its own browser session
    pub workers: usize,

    /// Run OCR over page images
    pub extract_images: bool,

    /// Images considered per page when OCR is enabled
    pub max_images: usize,

    /// How long to wait for a page's `body` to appear, in seconds
    pub page_load_timeout_secs: u64,

    /// Download timeout for a single image, in seconds
    pub image_timeout_secs: u64,

    /// Pages with less text than this are skipped
    pub min_content_chars: usize,

    /// Refuse loopback, private and metadata hosts
    pub block_private_hosts: bool,

    /// Swap a website's previously stored chunks for the new ones
    pub replace_existing: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_pages: 15,
            workers: 3,
            extract_images: true,
            max_images: 5,
            page_load_timeout_secs: 10,
            image_timeout_secs: 10,
            min_content_chars: 100,
            block_private_hosts: true,
            replace_existing: false,
        }
    }
}

impl ScrapeConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum pages.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max.max(1);
        self
    }

    /// Set the worker bound.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enable or disable image OCR.
    pub fn with_image_extraction(mut self, enabled: bool) -> Self {
        self.extract_images = enabled;
        self
    }

    /// Set the per-page image cap.
    pub fn with_max_images(mut self, max: usize) -> Self {
        self.max_images = max;
        self
    }

    /// Allow crawling loopback and private hosts (tests, intranets).
    pub fn allow_private_hosts(mut self) -> Self {
        self.block_private_hosts = false;
        self
    }

    /// Replace a website's stored chunks on re-scrape.
    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = replace;
        self
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}

/// Configuration for chunking and answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Words per chunk window (windows do not overlap)
    pub chunk_words: usize,

    /// Chunks with less trimmed text than this are dropped
    pub min_chunk_chars: usize,

    /// Nearest chunks retrieved per question
    pub top_n: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_words: 800,
            min_chunk_chars: 100,
            top_n: 5,
        }
    }
}

impl RetrievalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of chunks retrieved per question.
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n.max(1);
        self
    }

    /// Set the chunk window size in words.
    pub fn with_chunk_words(mut self, words: usize) -> Self {
        self.chunk_words = words.max(1);
        self
    }
}

/// Where chunks are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file
    pub path: PathBuf,

    /// Collection name
    pub collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./ask_web.db"),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// sqlx connection URL for the database file, created if missing.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path.display())
    }
}

/// Which OCR engine reads image text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// Local `tesseract` executable, CPU only
    #[default]
    Tesseract,

    /// Hosted vision model, GPU backed
    Vision,
}

impl std::str::FromStr for OcrBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" | "cpu" => Ok(Self::Tesseract),
            "vision" | "gpu" => Ok(Self::Vision),
            other => Err(format!("unknown OCR backend: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.max_pages, 15);
        assert_eq!(config.workers, 3);
        assert_eq!(config.max_images, 5);
        assert!(config.extract_images);
        assert_eq!(config.page_load_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_builders_clamp_to_one() {
        let config = ScrapeConfig::new().with_workers(0).with_max_pages(0);
        assert_eq!(config.workers, 1);
        assert_eq!(config.max_pages, 1);
        assert_eq!(RetrievalConfig::new().with_top_n(0).top_n, 1);
    }

    #[test]
    fn test_database_url() {
        let storage = StorageConfig::new("/tmp/chat.db");
        assert_eq!(storage.database_url(), "sqlite:///tmp/chat.db?mode=rwc");
        assert_eq!(storage.collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn test_ocr_backend_parse() {
        assert_eq!("gpu".parse::<OcrBackend>().unwrap(), OcrBackend::Vision);
        assert_eq!("Tesseract".parse::<OcrBackend>().unwrap(), OcrBackend::Tesseract);
        assert!("easy".parse::<OcrBackend>().is_err());
    }
}
