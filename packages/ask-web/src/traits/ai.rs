//! Language model capabilities: answer generation and text embedding.

use async_trait::async_trait;

use crate::error::Result;

/// Hosted text generation.
///
/// Implementations wrap one provider's completion endpoint. The prompt is
/// already fully assembled; no prompting strategy lives behind this trait.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logs and stats.
    fn model(&self) -> &str;
}

/// Text embedding for similarity search.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Length of the vectors this embedder produces.
    fn dimensions(&self) -> usize;
}
