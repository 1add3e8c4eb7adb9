//! Configuration loaded from the environment (and `.env`).

use anyhow::{Context, Result};
use ask_web::types::config::DEFAULT_COLLECTION;
use ask_web::ApiKey;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<ApiKey>,
    pub openai_api_key: Option<ApiKey>,
    pub db_path: PathBuf,
    pub collection: String,
    pub gemini_model: Option<String>,
    pub openai_model: Option<String>,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenv();

        Ok(Self {
            gemini_api_key: non_empty("GEMINI_API_KEY").map(ApiKey::new),
            openai_api_key: non_empty("OPENAI_API_KEY").map(ApiKey::new),
            db_path: non_empty("ASK_WEB_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./ask_web.db")),
            collection: non_empty("ASK_WEB_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            gemini_model: non_empty("ASK_WEB_GEMINI_MODEL"),
            openai_model: non_empty("ASK_WEB_OPENAI_MODEL"),
        })
    }

    pub fn require_gemini_key(&self) -> Result<&ApiKey> {
        self.gemini_api_key
            .as_ref()
            .context("GEMINI_API_KEY must be set")
    }

    pub fn require_openai_key(&self) -> Result<&ApiKey> {
        self.openai_api_key
            .as_ref()
            .context("OPENAI_API_KEY must be set")
    }
}
