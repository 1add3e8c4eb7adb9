//! URL normalization and scrape eligibility checks.
//!
//! Every URL that enters the frontier goes through [`normalize`] before it is
//! compared against the discovered set, so `https://Ex.com/a/` and
//! `https://ex.com/a#top` count as the same page.

use url::Url;

use crate::error::{CrawlError, CrawlResult};

/// Extensions that never yield readable page text.
const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".bmp", ".ico", ".zip", ".tar",
    ".gz", ".rar", ".7z", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".mp3", ".mp4",
    ".avi", ".mov", ".mkv", ".webm",
];

/// Path fragments that mark informational pages worth crawling first.
pub const PRIORITY_PATTERNS: &[&str] = &[
    "/about",
    "/services",
    "/products",
    "/blog",
    "/news",
    "/faq",
    "/contact",
    "/help",
    "/docs",
    "/documentation",
    "/api",
];

/// Canonicalize a URL: lowercased host, no fragment, no trailing slash.
///
/// The query string is preserved.
pub fn normalize(url: &str) -> CrawlResult<String> {
    let parsed = Url::parse(url.trim()).map_err(|_| CrawlError::invalid(url))?;
    Ok(normalize_parsed(&parsed))
}

/// [`normalize`] for an already parsed URL.
pub fn normalize_parsed(url: &Url) -> String {
    let mut normalized = format!("{}://", url.scheme());
    if let Some(host) = url.host_str() {
        normalized.push_str(&host.to_lowercase());
    }
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{}", port));
    }
    normalized.push_str(url.path());
    if let Some(query) = url.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized.trim_end_matches('/').to_string()
}

/// Host of a URL, lowercased, with one leading `www.` removed.
pub fn bare_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    })
}

/// Whether two URLs live on the same site, ignoring a `www.` prefix.
pub fn is_same_domain(a: &str, b: &str) -> bool {
    match (bare_host(a), bare_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Parse a URL and check it points at a scrapeable HTML page.
///
/// Fails with [`CrawlError::InvalidUrl`] when the scheme or host is missing,
/// or when the path ends in a known binary/media extension.
pub fn validate_for_scraping(url: &str) -> CrawlResult<Url> {
    let parsed = Url::parse(url.trim()).map_err(|_| CrawlError::invalid(url))?;

    if parsed.scheme().is_empty() || parsed.host_str().map_or(true, str::is_empty) {
        return Err(CrawlError::invalid(url));
    }

    let path = parsed.path().to_lowercase();
    if SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return Err(CrawlError::invalid(url));
    }

    Ok(parsed)
}

/// Boolean form of [`validate_for_scraping`].
pub fn is_valid_for_scraping(url: &str) -> bool {
    validate_for_scraping(url).is_ok()
}

/// Whether the URL path contains one of [`PRIORITY_PATTERNS`].
pub fn is_priority_path(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => return false,
    };
    PRIORITY_PATTERNS.iter().any(|pattern| path.contains(pattern))
}

/// Prefix `https://` when the user typed a bare domain.
pub fn with_default_scheme(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ignores_fragment_and_trailing_slash() {
        let variants = [
            "https://Example.com/docs/",
            "https://example.com/docs",
            "https://example.com/docs#intro",
            "https://EXAMPLE.com/docs/#intro",
        ];
        let normalized: Vec<_> = variants.iter().map(|u| normalize(u).unwrap()).collect();
        assert!(normalized.iter().all(|n| n == "https://example.com/docs"));
    }

    #[test]
    fn test_normalize_keeps_query_and_port() {
        assert_eq!(
            normalize("http://Example.com:8080/search?q=rust#results").unwrap(),
            "http://example.com:8080/search?q=rust"
        );
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize("https://example.com/").unwrap(), "https://example.com");
        assert_eq!(normalize("https://example.com").unwrap(), "https://example.com");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(matches!(
            normalize("not a url"),
            Err(CrawlError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_same_domain_strips_www() {
        assert!(is_same_domain("http://www.ex.com/a", "https://ex.com/b"));
        assert!(is_same_domain("https://EX.com", "https://www.ex.com/"));
        assert!(!is_same_domain("http://a.com", "http://b.com"));
        assert!(!is_same_domain("http://blog.ex.com", "http://ex.com"));
        assert!(!is_same_domain("garbage", "http://ex.com"));
    }

    #[test]
    fn test_validate_rejects_binary_resources() {
        assert!(!is_valid_for_scraping("https://ex.com/report.PDF"));
        assert!(!is_valid_for_scraping("https://ex.com/logo.png"));
        assert!(!is_valid_for_scraping("https://ex.com/archive.zip"));
        assert!(!is_valid_for_scraping("https://ex.com/clip.mp4"));
        assert!(!is_valid_for_scraping("https://ex.com/letter.docx"));
        assert!(is_valid_for_scraping("https://ex.com/about"));
        assert!(is_valid_for_scraping("https://ex.com/page.html"));
    }

    #[test]
    fn test_validate_requires_host() {
        assert!(!is_valid_for_scraping("/relative/path"));
        assert!(!is_valid_for_scraping("mailto:someone@ex.com"));
        assert!(!is_valid_for_scraping(""));
    }

    #[test]
    fn test_priority_paths() {
        assert!(is_priority_path("https://ex.com/about-us"));
        assert!(is_priority_path("https://ex.com/en/Docs/intro"));
        assert!(is_priority_path("https://ex.com/FAQ"));
        assert!(!is_priority_path("https://ex.com/pricing"));
        assert!(!is_priority_path("https://ex.com/?page=/about"));
    }

    #[test]
    fn test_with_default_scheme() {
        assert_eq!(with_default_scheme("example.com"), "https://example.com");
        assert_eq!(with_default_scheme("http://example.com"), "http://example.com");
    }
}
