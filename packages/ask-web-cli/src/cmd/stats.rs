//! Collection statistics

use anyhow::{Context, Result};
use console::style;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let stats = ctx
        .session
        .stats()
        .await
        .context("Failed to read collection stats")?;

    ctx.print_header("Collection");
    println!("  {:<12} {}", style("name").dim(), stats.collection_name);
    println!("  {:<12} {}", style("chunks").dim(), stats.total_chunks);
    println!("  {:<12} {}", style("model").dim(), ctx.model);
    Ok(())
}
