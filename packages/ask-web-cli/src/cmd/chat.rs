//! Interactive chat loop

use anyhow::Result;
use console::style;
use dialoguer::Input;

use crate::context::AppContext;

use super::{print_reply, scrape::scrape_site};

const HELP: &str = "/scrape <url>  load another website\n/clear         forget the conversation\n/stats         collection statistics\n/exit          quit";

pub async fn run(ctx: &mut AppContext, url: Option<&str>) -> Result<()> {
    if let Some(url) = url {
        scrape_site(ctx, url).await?;
    }

    ctx.print_header("Ask anything about the website content");
    println!("{}", style(HELP).dim());

    loop {
        let line: String = Input::with_theme(&ctx.theme())
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();

        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/help" => println!("{}", style(HELP).dim()),
            "/clear" => {
                ctx.session.clear();
                ctx.print_info("Conversation cleared");
            }
            "/stats" => super::stats::run(ctx).await?,
            _ => {
                if let Some(url) = line.strip_prefix("/scrape ") {
                    if let Err(e) = scrape_site(ctx, url.trim()).await {
                        ctx.print_warning(&format!("{:#}", e));
                    }
                    continue;
                }
                if ctx.session.last_url().is_none() {
                    ctx.print_warning("No website loaded in this session, answering from stored content");
                }
                let reply = ctx.session.ask(line).await;
                print_reply(&reply);
            }
        }
    }

    Ok(())
}
