//! Website scraping: URL discovery, page fetch and image OCR.
//!
//! ```text
//! seed ─▶ FrontierBuilder ─▶ [urls] ─▶ ScrapeOrchestrator ─▶ PageFetcher × N ─▶ [PageRecord]
//!                                                               └─▶ ImageTextExtractor
//! ```

pub mod fetcher;
pub mod frontier;
pub mod html;
pub mod images;
pub mod orchestrator;

pub use fetcher::PageFetcher;
pub use frontier::FrontierBuilder;
pub use images::ImageTextExtractor;
pub use orchestrator::{ScrapeOrchestrator, ScrapeProgress};
