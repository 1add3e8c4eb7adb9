//! `ask-web`: scrape a website and chat with it from the terminal.

mod cmd;
mod config;
mod context;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ask_web::{BrowserKind, OcrBackend, Provider};

use crate::config::Config;
use crate::context::AppContext;

#[derive(Parser, Debug)]
#[command(name = "ask-web", version, about = "Ask questions about any website")]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Options {
    /// Maximum pages to scrape
    #[arg(long, global = true, default_value_t = 15, value_parser = clap::value_parser!(u16).range(1..=50))]
    pub max_pages: u16,

    /// Pages fetched in parallel
    #[arg(long, global = true, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub workers: u8,

    /// Skip text recognition in images
    #[arg(long, global = true)]
    pub no_ocr: bool,

    /// OCR engine: tesseract (CPU) or vision (hosted GPU model)
    #[arg(long, global = true, default_value = "tesseract")]
    pub ocr_engine: OcrBackend,

    /// Page renderer: http (static HTML) or chrome (headless, needs the `chrome` feature)
    #[arg(long, global = true, default_value = "http")]
    pub browser: BrowserKind,

    /// Collection name (overrides ASK_WEB_COLLECTION)
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Delete a site's previously stored chunks before storing new ones
    #[arg(long, global = true)]
    pub replace_existing: bool,

    /// Answer generator: gemini or openai
    #[arg(long, global = true, default_value = "gemini")]
    pub provider: Provider,

    /// Embeddings: hash (offline) or openai
    #[arg(long, global = true, default_value = "hash")]
    pub embedder: cmd::EmbedderKind,

    /// Allow scraping localhost and private network addresses
    #[arg(long, global = true)]
    pub allow_private: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a website and store its content
    Scrape {
        /// Website URL (https:// is assumed when omitted)
        url: String,
    },

    /// Ask one question about stored content
    Ask {
        /// The question
        question: String,
    },

    /// Interactive chat, optionally scraping a site first
    Chat {
        /// Website to scrape before chatting
        url: Option<String>,
    },

    /// Ask a spoken question from an audio file
    Voice {
        /// Recorded question (wav, mp3, m4a, webm...)
        audio: PathBuf,

        /// Write the spoken answer (mp3) here
        #[arg(long)]
        speak: Option<PathBuf>,
    },

    /// Convert text to speech
    Speak {
        /// Text to speak
        text: String,

        /// Output mp3 file
        #[arg(long, short)]
        out: PathBuf,
    },

    /// Show collection statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ask_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Scrape { url } => {
            let mut ctx = AppContext::build(&config, &cli.options, false).await?;
            cmd::scrape::run(&mut ctx, &url).await
        }
        Command::Ask { question } => {
            let mut ctx = AppContext::build(&config, &cli.options, true).await?;
            cmd::ask::run(&mut ctx, &question).await
        }
        Command::Chat { url } => {
            let mut ctx = AppContext::build(&config, &cli.options, true).await?;
            cmd::chat::run(&mut ctx, url.as_deref()).await
        }
        Command::Voice { audio, speak } => {
            let mut ctx = AppContext::build(&config, &cli.options, true).await?;
            cmd::voice::run(&mut ctx, &config, &audio, speak.as_deref()).await
        }
        Command::Speak { text, out } => cmd::voice::speak(&config, &text, &out).await,
        Command::Stats => {
            let ctx = AppContext::build(&config, &cli.options, false).await?;
            cmd::stats::run(&ctx).await
        }
    }
}
