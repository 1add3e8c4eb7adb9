//! Provider implementations of the generation, embedding and speech traits.
//!
//! - [`Gemini`]: answer generation (default provider)
//! - [`OpenAI`]: generation, embeddings, speech-to-text and text-to-speech
//! - [`HashEmbedder`]: offline embeddings, no network

pub mod gemini;
pub mod hash_embedder;
pub mod openai;

use std::str::FromStr;

pub use gemini::Gemini;
pub use hash_embedder::HashEmbedder;
pub use openai::OpenAI;

/// Which hosted model answers questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAI,
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "gpt" => Ok(Self::OpenAI),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Build a provider error with the response body attached.
pub(crate) async fn provider_error(provider: &str, response: reqwest::Response) -> crate::error::ExtractionError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    crate::error::ExtractionError::AI(format!("{} error {}: {}", provider, status, body).into())
}
