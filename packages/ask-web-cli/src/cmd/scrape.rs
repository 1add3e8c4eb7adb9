//! Scrape a website into the store

use anyhow::{Context, Result};
use colored::Colorize;
use tokio::sync::mpsc;

use ask_web::urls::with_default_scheme;
use ask_web::{ScrapeProgress, ScrapeReport};

use crate::context::AppContext;

pub async fn run(ctx: &mut AppContext, url: &str) -> Result<()> {
    scrape_site(ctx, url).await.map(|_| ())
}

/// Scrape `url`, printing one line per finished page.
pub async fn scrape_site(ctx: &mut AppContext, url: &str) -> Result<ScrapeReport> {
    let url = with_default_scheme(url);
    ctx.print_header(&format!("Scraping {}", url));

    let (tx, mut rx) = mpsc::unbounded_channel::<ScrapeProgress>();
    let printer = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            println!(
                "  {} {}",
                format!("[{}/{}]", progress.completed, progress.total).dimmed(),
                progress.url
            );
        }
    });

    let result = ctx.session.scrape_with_progress(&url, Some(tx)).await;
    // The sender is dropped with the scrape future, so the printer drains and exits.
    let _ = printer.await;

    let report = result.with_context(|| format!("Failed to scrape {}", url))?;
    print_report(ctx, &report);
    Ok(report)
}

fn print_report(ctx: &AppContext, report: &ScrapeReport) {
    if report.cached {
        ctx.print_info(&format!(
            "{} is already loaded ({} pages)",
            report.url, report.pages
        ));
        return;
    }

    ctx.print_success(&format!(
        "Scraped {} pages ({} with image text), stored {} chunks in '{}'",
        report.pages, report.images, report.chunks_stored, ctx.collection
    ));
    if report.chunks_stored == 0 {
        ctx.print_warning("No chunk had enough text to store");
    }

    for page in ctx.session.pages() {
        println!(
            "  {} {}",
            "•".green(),
            format!("{} ({} words)", page.title, page.word_count())
        );
        println!("    {}", page.url.dimmed());
    }
}
