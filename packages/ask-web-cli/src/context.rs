//! Application context: the chat session and terminal helpers

use anyhow::{Context, Result};
use async_trait::async_trait;
use console::style;
use dialoguer::theme::ColorfulTheme;
use std::sync::Arc;
use tracing::warn;

use ask_web::ai::{Gemini, OpenAI};
use ask_web::error::ExtractionError;
use ask_web::{
    ChatSession, Collection, Embedder, Generator, HashEmbedder, Provider, RetrievalConfig,
    ScrapeConfig, SqliteStore, StorageConfig,
};

use crate::cmd::EmbedderKind;
use crate::config::Config;
use crate::Options;

/// Stand-in generator for commands that never answer questions.
struct Unconfigured {
    reason: String,
}

#[async_trait]
impl Generator for Unconfigured {
    async fn generate(&self, _prompt: &str) -> ask_web::error::Result<String> {
        Err(ExtractionError::Config(self.reason.clone().into()))
    }

    fn model(&self) -> &str {
        "unconfigured"
    }
}

/// Application context passed to all commands
pub struct AppContext {
    pub session: ChatSession,
    pub collection: String,
    pub model: String,
}

impl AppContext {
    /// Open the store and assemble a session.
    ///
    /// With `needs_generator` unset, a missing provider key is tolerated so
    /// that scraping and stats work without one.
    pub async fn build(config: &Config, options: &Options, needs_generator: bool) -> Result<Self> {
        let collection_name = options
            .collection
            .clone()
            .unwrap_or_else(|| config.collection.clone());
        let storage = StorageConfig::new(&config.db_path).with_collection(&collection_name);
        let store = SqliteStore::open(&storage)
            .await
            .with_context(|| format!("Failed to open {}", storage.path.display()))?;

        let embedder: Arc<dyn Embedder> = match options.embedder {
            EmbedderKind::Hash => Arc::new(HashEmbedder::default()),
            EmbedderKind::OpenAI => Arc::new(OpenAI::new(config.require_openai_key()?.clone())),
        };
        let collection = Collection::new(Arc::new(store), embedder, &collection_name);

        let generator = match build_generator(config, options.provider) {
            Ok(generator) => generator,
            Err(e) if !needs_generator => {
                warn!(error = %e, "No answer generator configured");
                Arc::new(Unconfigured {
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        let model = generator.model().to_string();

        let scrape = ScrapeConfig::new()
            .with_max_pages(options.max_pages as usize)
            .with_workers(options.workers as usize)
            .with_image_extraction(!options.no_ocr)
            .with_replace_existing(options.replace_existing);
        let scrape = if options.allow_private {
            scrape.allow_private_hosts()
        } else {
            scrape
        };

        let browser = options.browser.build().context("Failed to start browser")?;
        let mut builder = ChatSession::builder(browser, collection, generator)
            .scrape_config(scrape)
            .retrieval_config(RetrievalConfig::default());
        if !options.no_ocr {
            let ocr = ask_web::ocr::build_engine(options.ocr_engine, config.openai_api_key.as_ref())
                .context("Failed to set up OCR")?;
            builder = builder.ocr(ocr);
        }

        Ok(Self {
            session: builder.build(),
            collection: collection_name,
            model,
        })
    }

    pub fn theme(&self) -> ColorfulTheme {
        ColorfulTheme::default()
    }

    pub fn print_header(&self, msg: &str) {
        println!();
        println!("{}", style(msg).bold());
    }

    pub fn print_success(&self, msg: &str) {
        println!("{}", style(msg).green());
    }

    pub fn print_warning(&self, msg: &str) {
        println!("{}", style(msg).yellow());
    }

    pub fn print_info(&self, msg: &str) {
        println!("{}", style(msg).cyan());
    }
}

fn build_generator(config: &Config, provider: Provider) -> Result<Arc<dyn Generator>> {
    Ok(match provider {
        Provider::Gemini => {
            let mut gemini = Gemini::new(config.require_gemini_key()?.clone());
            if let Some(model) = &config.gemini_model {
                gemini = gemini.with_model(model);
            }
            Arc::new(gemini)
        }
        Provider::OpenAI => {
            let mut openai = OpenAI::new(config.require_openai_key()?.clone());
            if let Some(model) = &config.openai_model {
                openai = openai.with_model(model);
            }
            Arc::new(openai)
        }
    })
}
