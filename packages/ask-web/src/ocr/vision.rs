//! OCR through a hosted vision model (OpenAI-compatible chat endpoint).

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{OcrError, OcrResult};
use crate::security::ApiKey;
use crate::traits::ocr::OcrEngine;

const TRANSCRIBE_INSTRUCTION: &str = "Transcribe all text visible in this image exactly as written. \
Reply with the text only. If there is no text, reply with nothing.";

/// Vision-model OCR.
#[derive(Clone)]
pub struct VisionOcr {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl VisionOcr {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at another OpenAI-compatible server (a local GPU host, a proxy).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Guess a MIME type from magic bytes; the model rejects unlabeled data URLs.
fn sniff_mime(image: &[u8]) -> &'static str {
    match image {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

#[derive(Serialize)]
struct VisionRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    temperature: f32,
}

#[derive(Deserialize)]
struct VisionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl OcrEngine for VisionOcr {
    async fn recognize(&self, image: &[u8]) -> OcrResult<String> {
        let data_url = format!(
            "data:{};base64,{}",
            sniff_mime(image),
            base64::engine::general_purpose::STANDARD.encode(image)
        );

        let request = VisionRequest {
            model: self.model.clone(),
            messages: vec![json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": TRANSCRIBE_INSTRUCTION },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            })],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Recognition(format!("{}: {}", status, body)));
        }

        let parsed: VisionResponse = response
            .json()
            .await
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn name(&self) -> &str {
        "vision"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&[0x89, b'P', b'N', b'G', 0x0D]), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8"), "image/webp");
        assert_eq!(sniff_mime(b"<svg"), "application/octet-stream");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let ocr = VisionOcr::new(ApiKey::new("sk-secret"));
        assert_eq!(format!("{:?}", ocr.api_key), "[REDACTED]");
    }
}
