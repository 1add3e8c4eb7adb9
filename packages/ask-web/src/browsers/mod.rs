//! Browser implementations.
//!
//! - [`HttpBrowser`]: plain HTTP fetch, static HTML only, always available
//! - `ChromeBrowser`: headless Chrome over CDP (feature `chrome`)
//!
//! Sessions are wrapped in a [`SessionGuard`] by the scrape code so they are
//! closed on every exit path.

pub mod guard;
pub mod http;

#[cfg(feature = "chrome")]
pub mod chrome;

use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CrawlError, CrawlResult};
use crate::traits::browser::Browser;

pub use guard::SessionGuard;
pub use http::HttpBrowser;

#[cfg(feature = "chrome")]
pub use chrome::ChromeBrowser;

/// Which browser backend renders pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Http,
    Chrome,
}

impl FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" | "static" => Ok(Self::Http),
            "chrome" | "chromium" => Ok(Self::Chrome),
            other => Err(format!("unknown browser: {}", other)),
        }
    }
}

impl BrowserKind {
    /// Construct the backend.
    pub fn build(self) -> CrawlResult<Arc<dyn Browser>> {
        match self {
            Self::Http => Ok(Arc::new(HttpBrowser::new()?)),
            #[cfg(feature = "chrome")]
            Self::Chrome => Ok(Arc::new(ChromeBrowser::new())),
            #[cfg(not(feature = "chrome"))]
            Self::Chrome => Err(CrawlError::Browser(
                "built without the `chrome` feature".to_string(),
            )),
        }
    }
}
