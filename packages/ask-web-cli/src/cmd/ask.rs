//! Answer one question from stored content

use anyhow::Result;

use crate::context::AppContext;

use super::print_reply;

pub async fn run(ctx: &mut AppContext, question: &str) -> Result<()> {
    let reply = ctx.session.ask(question).await;
    print_reply(&reply);
    Ok(())
}
