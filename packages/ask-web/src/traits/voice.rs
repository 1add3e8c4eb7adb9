//! Speech capabilities for the voice chat modality.

use async_trait::async_trait;

use crate::error::Result;

/// Speech-to-text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe recorded audio. `file_name` carries the container format
    /// (`question.wav`, `clip.mp3`) for services that sniff by extension.
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<String>;
}

/// Text-to-speech.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text` as MP3 audio.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
