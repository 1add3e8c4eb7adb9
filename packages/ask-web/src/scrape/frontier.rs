//! Discovery of same-site URLs to scrape.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::browsers::SessionGuard;
use crate::error::{CrawlError, CrawlResult};
use crate::security::UrlValidator;
use crate::traits::browser::Browser;
use crate::types::config::ScrapeConfig;
use crate::urls;

/// Builds the ordered list of pages a scrape will visit.
#[derive(Clone)]
pub struct FrontierBuilder {
    browser: Arc<dyn Browser>,
    validator: Option<UrlValidator>,
    page_load_timeout: Duration,
}

impl FrontierBuilder {
    pub fn new(browser: Arc<dyn Browser>, config: &ScrapeConfig) -> Self {
        Self {
            browser,
            validator: config.block_private_hosts.then(UrlValidator::new),
            page_load_timeout: config.page_load_timeout(),
        }
    }

    /// Seed first, then priority pages, then everything else, capped at
    /// `max_pages`.
    ///
    /// Links come from the seed page only. If the seed cannot be loaded the
    /// frontier is just the seed, so the fetch step reports the real error.
    pub async fn build(&self, seed: &str, max_pages: usize) -> Vec<String> {
        let seed = seed.trim().to_string();
        let max_pages = max_pages.max(1);

        let links = match self.seed_links(&seed).await {
            Ok(links) => links,
            Err(e) => {
                warn!(url = %seed, error = %e, "Could not load seed page, scraping it alone");
                return vec![seed];
            }
        };

        let frontier = order_frontier(&seed, links, max_pages, self.validator.as_ref());
        info!(
            url = %seed,
            discovered = frontier.len(),
            max_pages,
            "Built URL frontier"
        );
        frontier
    }

    async fn seed_links(&self, seed: &str) -> CrawlResult<Vec<String>> {
        let seed_url = Url::parse(seed).map_err(|_| CrawlError::invalid(seed))?;
        if let Some(validator) = &self.validator {
            validator.check_resolved(&seed_url).await?;
        }

        let mut guard = SessionGuard::open(self.browser.as_ref(), seed).await?;
        let loaded: CrawlResult<(String, Option<String>)> = async {
            guard.navigate(seed).await?;
            guard.wait_for("body", self.page_load_timeout).await?;
            let rendered = guard.html().await?;
            Ok((rendered, guard.current_url().await?))
        }
        .await;
        if let Err(e) = guard.close().await {
            debug!(url = %seed, error = %e, "Session close failed after discovery");
        }
        let (rendered, landed) = loaded?;

        // Relative links resolve against where the seed landed.
        let page_url = match landed.as_deref().map(Url::parse) {
            Some(Ok(landed)) => {
                if let Some(validator) = &self.validator {
                    validator.check_resolved(&landed).await?;
                }
                landed
            }
            _ => seed_url,
        };

        Ok(super::html::links(&rendered, &page_url))
    }
}

/// Filter, dedupe and order raw links found on the seed page.
///
/// Links are compared in normalized form; the normalized seed is treated as
/// already discovered. Output entries other than the seed are normalized.
pub fn order_frontier(
    seed: &str,
    links: Vec<String>,
    max_pages: usize,
    validator: Option<&UrlValidator>,
) -> Vec<String> {
    let mut discovered: HashSet<String> = HashSet::new();
    if let Ok(normalized_seed) = urls::normalize(seed) {
        discovered.insert(normalized_seed);
    }

    let mut priority = Vec::new();
    let mut regular = Vec::new();

    for link in links {
        let Ok(parsed) = urls::validate_for_scraping(&link) else {
            continue;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            continue;
        }
        let normalized = urls::normalize_parsed(&parsed);
        if !urls::is_same_domain(seed, &normalized) {
            continue;
        }
        if validator.is_some_and(|v| v.check(&parsed).is_err()) {
            continue;
        }
        if !discovered.insert(normalized.clone()) {
            continue;
        }

        if urls::is_priority_path(&normalized) {
            priority.push(normalized);
        } else {
            regular.push(normalized);
        }
    }

    std::iter::once(seed.to_string())
        .chain(priority)
        .chain(regular)
        .take(max_pages)
        .collect()
}
