//! Typed errors for the ask-web library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Most of these never escape
//! a batch: the scrape pipeline logs them and drops the failing unit
//! (one image, one page, one query).

use thiserror::Error;

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Crawl operation failed
    #[error("crawl failed: {0}")]
    Crawl(#[from] CrawlError),

    /// Generation or speech service unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A write would introduce a document id that already exists
    #[error("duplicate document id: {id}")]
    DuplicateDocument { id: String },

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A scrape finished without a single usable page
    #[error("no content scraped from {url}")]
    NoContent { url: String },

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur while fetching a single page.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Security validation failed
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Browser session could not be opened or driven
    #[error("browser error: {0}")]
    Browser(String),

    /// URL is malformed or points at a non-text resource
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Page did not become ready in time
    #[error("timeout loading: {url}")]
    Timeout { url: String },
}

/// Errors raised by an OCR engine for a single image.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Image bytes could not be downloaded
    #[error("image download failed: {0}")]
    Download(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The OCR engine could not be started or reached
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// The engine ran but rejected the image
    #[error("OCR failed: {0}")]
    Recognition(String),
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal IPs)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for crawl operations.
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

/// Result type alias for OCR operations.
pub type OcrResult<T> = std::result::Result<T, OcrError>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

impl CrawlError {
    /// Shorthand for an [`CrawlError::InvalidUrl`].
    pub fn invalid(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
