//! Text, link and image extraction from rendered HTML.
//!
//! All functions here are synchronous: `scraper::Html` is not `Send`, so it
//! is parsed and dropped without crossing an `.await`.

use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose whole subtree is boilerplate.
const STRIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "nav", "header", "footer", "aside",
    "sidebar", "ads",
];

/// Elements that start a new line of text. Everything else is inline.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "body", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Class or id values marking sidebars and ad slots.
const STRIPPED_MARKERS: &[&str] = &["sidebar", "ads", "advertisement"];

/// Title and visible text of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub text: String,
}

fn is_stripped(element: &Element) -> bool {
    let name = element.name().to_ascii_lowercase();
    if STRIPPED_TAGS.contains(&name.as_str()) {
        return true;
    }
    let marked = |value: &str| STRIPPED_MARKERS.contains(&value.to_ascii_lowercase().as_str());
    element.classes().any(marked) || element.id().is_some_and(marked)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if is_stripped(child_element.value()) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&child_element.value().name().to_ascii_lowercase().as_str());
            if block {
                out.push('\n');
            }
            collect_text(child_element, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// Split into lines and double-space separated phrases, trim each, drop
/// blanks, join with single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Title and boilerplate-free visible text.
///
/// Block elements are separated by line breaks before collapsing, so their
/// words never glue together; inline markup joins its text as written.
pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);

    ParsedPage {
        title: extract_title(&document),
        text: collapse_whitespace(&text),
    }
}

/// The URL relative references resolve against: the first `<base href>`
/// when present, otherwise `page_url`.
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            let href = document.select(&selector).next()?.value().attr("href")?;
            page_url.join(href.trim()).ok()
        })
        .unwrap_or_else(|| page_url.clone())
}

/// Absolute `a[href]` targets in document order.
///
/// `page_url` is the address the document was loaded from, after redirects.
pub fn links(html: &str, page_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|url| url.to_string())
        .collect()
}

/// Resolved sources of the first `max` `<img>` elements.
///
/// Each entry carries the image's 1-based position among those `max`
/// elements. Images without a `src`, with an inline `data:` source, or with
/// an unresolvable one are left out but still use up a position.
pub fn image_sources(html: &str, page_url: &Url, max: usize) -> Vec<(usize, String)> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);
    document
        .select(&selector)
        .take(max)
        .enumerate()
        .filter_map(|(i, el)| {
            let src = el.value().attr("src")?.trim();
            if src.is_empty() || src.starts_with("data:") {
                return None;
            }
            let resolved = base.join(src).ok()?;
            Some((i + 1, resolved.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head><title> Acme Widgets </title><style>body { color: red; }</style></head>
          <body>
            <header>Top banner</header>
            <nav><a href="/about">About</a></nav>
            <main>
              <h1>Welcome</h1>
              <p>We make   widgets.</p>
              <p>Hello <b>world</b></p>
              <script>var tracking = 1;</script>
            </main>
            <div class="sidebar">Related links</div>
            <aside>Ads here</aside>
            <footer>Copyright</footer>
          </body>
        </html>
    "#;

    #[test]
    fn test_boilerplate_is_stripped() {
        let parsed = parse_page(PAGE);
        assert_eq!(parsed.title.as_deref(), Some("Acme Widgets"));
        assert_eq!(parsed.text, "Welcome We make widgets. Hello world");
        for gone in ["Top banner", "About", "tracking", "Related", "Ads here", "Copyright", "color"] {
            assert!(!parsed.text.contains(gone), "{} leaked", gone);
        }
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n\t b  \n c"), "a b c");
        assert_eq!(collapse_whitespace("one  two     three"), "one two three");
        assert_eq!(collapse_whitespace("\n \n"), "");
    }

    #[test]
    fn test_inline_markup_keeps_words_whole() {
        let parsed = parse_page("<p>Tele<b>phone</b>: <a href=\"tel:1\">555-0100</a></p><div>Open<br>daily</div>");
        assert_eq!(parsed.text, "Telephone: 555-0100 Open daily");
    }

    #[test]
    fn test_missing_title() {
        assert_eq!(parse_page("<p>text</p>").title, None);
    }

    #[test]
    fn test_links_resolve_against_base() {
        let base = Url::parse("https://ex.com/dir/page").unwrap();
        let html = r#"<a href="/a">A</a><a href="b">B</a><a href="https://other.org/">C</a><a>none</a>"#;
        assert_eq!(
            links(html, &base),
            vec!["https://ex.com/a", "https://ex.com/dir/b", "https://other.org/"]
        );
    }

    #[test]
    fn test_base_element_overrides_page_url() {
        let page_url = Url::parse("https://ex.com/").unwrap();
        let html = r#"<head><base href="/en/"></head><a href="pricing">P</a><img src="logo.png">"#;
        assert_eq!(links(html, &page_url), vec!["https://ex.com/en/pricing"]);
        assert_eq!(
            image_sources(html, &page_url, 5),
            vec![(1, "https://ex.com/en/logo.png".to_string())]
        );
    }

    #[test]
    fn test_image_sources_keep_positions() {
        let base = Url::parse("https://ex.com/").unwrap();
        let html = r#"
            <img src="/one.png">
            <img src="data:image/png;base64,AAAA">
            <img alt="no src">
            <img src="four.jpg">
            <img src="/five.png">
            <img src="/six.png">
        "#;
        assert_eq!(
            image_sources(html, &base, 5),
            vec![
                (1, "https://ex.com/one.png".to_string()),
                (4, "https://ex.com/four.jpg".to_string()),
                (5, "https://ex.com/five.png".to_string()),
            ]
        );
    }
}
