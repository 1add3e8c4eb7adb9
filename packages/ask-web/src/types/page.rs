//! Scraped page records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest page body kept after extraction, in characters.
pub const MAX_CONTENT_CHARS: usize = 12_000;

/// Title used when a page has no `<title>` element.
pub const UNTITLED: &str = "No Title";

/// One successfully scraped page.
///
/// Built by the page fetcher and never modified afterwards. The content
/// already includes any text recognised from the page's images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL the page was requested with
    pub url: String,

    /// Document title, or [`UNTITLED`]
    pub title: String,

    /// Visible text, at most [`MAX_CONTENT_CHARS`] characters
    pub content: String,

    /// Number of images whose text was recognised
    pub image_count: usize,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl PageRecord {
    /// Create a record, truncating content to [`MAX_CONTENT_CHARS`].
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let title = title.into();
        let title = title.trim();
        Self {
            url: url.into(),
            title: if title.is_empty() {
                UNTITLED.to_string()
            } else {
                title.to_string()
            },
            content: truncate_chars(content.into(), MAX_CONTENT_CHARS),
            image_count: 0,
            fetched_at: Utc::now(),
        }
    }

    /// Set the number of images that contributed text.
    pub fn with_image_count(mut self, count: usize) -> Self {
        self.image_count = count;
        self
    }

    /// Number of whitespace-separated words in the content.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// First `max_chars` characters of the content, for previews.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.content.chars().take(max_chars).collect();
        if self.content.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}

/// Truncate on a char boundary.
pub(crate) fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_truncated() {
        let page = PageRecord::new("https://ex.com", "Ex", "a".repeat(MAX_CONTENT_CHARS + 500));
        assert_eq!(page.content.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(text, 3), "ééé");
    }

    #[test]
    fn test_blank_title_defaults() {
        let page = PageRecord::new("https://ex.com", "   ", "body");
        assert_eq!(page.title, UNTITLED);

        let page = PageRecord::new("https://ex.com", "  Home ", "body");
        assert_eq!(page.title, "Home");
    }

    #[test]
    fn test_preview() {
        let page = PageRecord::new("https://ex.com", "Ex", "hello world");
        assert_eq!(page.preview(5), "hello...");
        assert_eq!(page.preview(50), "hello world");
        assert_eq!(page.word_count(), 2);
    }
}
