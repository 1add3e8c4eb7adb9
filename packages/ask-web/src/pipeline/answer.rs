//! Retrieval plus generation.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::stores::Collection;
use crate::traits::ai::Generator;
use crate::types::chat::ChatReply;

use super::prompts;

/// Answers questions from a collection's nearest chunks.
#[derive(Clone)]
pub struct AnswerComposer {
    collection: Collection,
    generator: Arc<dyn Generator>,
    top_n: usize,
}

impl AnswerComposer {
    pub fn new(collection: Collection, generator: Arc<dyn Generator>) -> Self {
        Self {
            collection,
            generator,
            top_n: 5,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Answer `query`.
    ///
    /// Nothing retrieved means no generation call. A generation failure is
    /// folded into the reply text; store and embedding errors are returned.
    pub async fn answer(&self, query: &str) -> Result<ChatReply> {
        let sources = self.collection.query(query, self.top_n).await?;
        if sources.is_empty() {
            debug!(query = %query, "No chunks retrieved");
            return Ok(ChatReply::NoRelevantContent);
        }

        let prompt = prompts::format_answer_prompt(query, &sources);
        debug!(
            model = %self.generator.model(),
            sources = sources.len(),
            "Generating answer"
        );

        match self.generator.generate(&prompt).await {
            Ok(text) => Ok(ChatReply::Answer { text, sources }),
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                Ok(ChatReply::GenerationFailed {
                    message: format!("Error generating response: {}", e),
                    sources,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::HashEmbedder;
    use crate::stores::MemoryStore;
    use crate::testing::{content_chunk, MockGenerator};
    use crate::types::chat::NO_RELEVANT_CONTENT;

    fn collection() -> Collection {
        Collection::new(Arc::new(MemoryStore::new()), Arc::new(HashEmbedder::default()), "test")
    }

    #[tokio::test]
    async fn test_empty_store_skips_generation() {
        let generator = Arc::new(MockGenerator::new("unused"));
        let composer = AnswerComposer::new(collection(), generator.clone());

        let reply = composer.answer("anything?").await.unwrap();
        assert_eq!(reply, ChatReply::NoRelevantContent);
        assert_eq!(reply.text(), NO_RELEVANT_CONTENT);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_answer_is_grounded_on_top_n() {
        let collection = collection();
        let chunks = (0..8)
            .map(|i| content_chunk(&i.to_string(), "https://ex.com", &format!("fact number {} about the shop", i)))
            .collect();
        collection.add(chunks).await.unwrap();

        let generator = Arc::new(MockGenerator::new("The shop has facts."));
        let composer = AnswerComposer::new(collection, generator.clone()).with_top_n(3);
        let reply = composer.answer("facts about the shop").await.unwrap();

        assert!(reply.is_answer());
        assert_eq!(reply.text(), "The shop has facts.");
        assert_eq!(reply.sources().len(), 3);
        assert_eq!(generator.calls(), 1);
        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("Source 3 (from "));
        assert!(!prompt.contains("Source 4 (from "));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_text() {
        let collection = collection();
        collection
            .add(vec![content_chunk("1", "https://ex.com", "some stored text")])
            .await
            .unwrap();

        let composer = AnswerComposer::new(collection, Arc::new(MockGenerator::failing("quota exceeded")));
        let reply = composer.answer("question").await.unwrap();

        assert!(matches!(reply, ChatReply::GenerationFailed { .. }));
        assert!(reply.text().starts_with("Error generating response: "));
        assert!(reply.text().contains("quota exceeded"));
        assert_eq!(reply.sources().len(), 1);
    }
}
