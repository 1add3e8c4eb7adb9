//! OpenAI client: chat generation, embeddings, Whisper transcription and TTS.
//!
//! ```rust,ignore
//! use ask_web::ai::OpenAI;
//!
//! let openai = OpenAI::new(ApiKey::new("sk-...")).with_model("gpt-4o");
//! let answer = openai.generate(&prompt).await?;
//! let audio = openai.synthesize(&answer).await?;
//! ```

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::security::ApiKey;
use crate::traits::ai::{Embedder, Generator};
use crate::traits::voice::{SpeechToText, TextToSpeech};

/// OpenAI-backed implementation of every model capability.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: ApiKey,
    model: String,
    embedding_model: String,
    embedding_dimensions: usize,
    transcription_model: String,
    speech_model: String,
    voice: String,
    base_url: String,
}

impl OpenAI {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            transcription_model: "whisper-1".to_string(),
            speech_model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ExtractionError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(ApiKey::new(key)))
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding model and the vector length it returns.
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimensions = dimensions;
        self
    }

    /// Set the TTS voice (default: alloy).
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose())
    }

    async fn post_json<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .header("Authorization", self.bearer())
            .json(body)
            .send()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(super::provider_error("OpenAI", response).await);
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

/// Put embeddings back in input order; the API tags each with its index.
fn ordered_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(ExtractionError::Embedding(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl Generator for OpenAI {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "OpenAI chat completion");
        let response: ChatResponse = self
            .post_json("chat/completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractionError::AI("No response from OpenAI".into()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAI {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExtractionError::Embedding("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse = self
            .post_json("embeddings", &request)
            .await
            .map_err(|e| ExtractionError::Embedding(e.to_string()))?
            .json()
            .await
            .map_err(|e| ExtractionError::Embedding(e.to_string()))?;

        ordered_embeddings(response.data, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }
}

#[async_trait]
impl SpeechToText for OpenAI {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<String> {
        let part = Part::bytes(audio.to_vec()).file_name(file_name.to_string());
        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(super::provider_error("OpenAI", response).await);
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;
        Ok(parsed.text.trim().to_string())
    }
}

#[async_trait]
impl TextToSpeech for OpenAI {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.speech_model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };
        let bytes = self
            .post_json("audio/speech", &request)
            .await?
            .bytes()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;
        Ok(bytes.to_vec())
    }
}
