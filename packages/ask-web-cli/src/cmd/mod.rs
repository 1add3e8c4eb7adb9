pub mod ask;
pub mod chat;
pub mod scrape;
pub mod stats;
pub mod voice;

use console::style;
use std::str::FromStr;

use ask_web::ChatReply;

/// Which embedder turns chunks into vectors.
///
/// A collection must always be written and queried with the same one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmbedderKind {
    #[default]
    Hash,
    OpenAI,
}

impl FromStr for EmbedderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hash" | "local" => Ok(Self::Hash),
            "openai" => Ok(Self::OpenAI),
            other => Err(format!("unknown embedder: {}", other)),
        }
    }
}

/// Print a reply followed by the chunks it was grounded on.
pub fn print_reply(reply: &ChatReply) {
    println!();
    println!("{}", reply.text());

    let sources = reply.sources();
    if sources.is_empty() {
        return;
    }
    println!();
    println!("{}", style("Sources").dim().bold());
    for (i, source) in sources.iter().enumerate() {
        println!(
            "  {} {} {}",
            style(format!("[{}]", i + 1)).dim(),
            source.metadata.title,
            style(format!("({:.2}) {}", source.relevance(), source.metadata.url)).dim()
        );
    }
}
