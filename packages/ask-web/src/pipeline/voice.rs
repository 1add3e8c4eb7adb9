//! Spoken questions and spoken answers.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::session::ChatSession;
use crate::traits::voice::{SpeechToText, TextToSpeech};
use crate::types::chat::ChatReply;

/// Reply when the transcript is empty.
pub const NOT_UNDERSTOOD: &str = "Sorry, I couldn't understand the audio.";

/// Outcome of a spoken question.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceReply {
    /// The question was understood and answered
    Answered {
        transcript: String,
        reply: ChatReply,
        /// MP3 of the reply, when a synthesizer is configured and succeeded
        audio: Option<Vec<u8>>,
    },

    /// Transcription produced no words
    NotUnderstood,

    /// The speech service failed
    ServiceError { message: String },
}

impl VoiceReply {
    pub fn text(&self) -> &str {
        match self {
            Self::Answered { reply, .. } => reply.text(),
            Self::NotUnderstood => NOT_UNDERSTOOD,
            Self::ServiceError { message } => message.as_str(),
        }
    }
}

/// Speech front end for a [`ChatSession`].
#[derive(Clone)]
pub struct VoiceAssistant {
    stt: Arc<dyn SpeechToText>,
    tts: Option<Arc<dyn TextToSpeech>>,
}

impl VoiceAssistant {
    pub fn new(stt: Arc<dyn SpeechToText>) -> Self {
        Self { stt, tts: None }
    }

    /// Speak replies back.
    pub fn with_speech(mut self, tts: Arc<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    /// Transcribe `audio` and ask it through `session`.
    ///
    /// Empty transcripts and transcription failures never reach retrieval.
    pub async fn ask(&self, session: &mut ChatSession, audio: &[u8], file_name: &str) -> VoiceReply {
        let transcript = match self.stt.transcribe(audio, file_name).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Transcription failed");
                return VoiceReply::ServiceError {
                    message: format!("Could not request results; {}", e),
                };
            }
        };

        if transcript.is_empty() {
            return VoiceReply::NotUnderstood;
        }
        debug!(transcript = %transcript, "Voice question");

        let reply = session.ask_spoken(&transcript).await;
        let audio = match self.speak(reply.text()).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(error = %e, "Speech synthesis failed, replying with text only");
                None
            }
        };

        VoiceReply::Answered {
            transcript,
            reply,
            audio,
        }
    }

    /// Synthesize `text` if a synthesizer is configured.
    pub async fn speak(&self, text: &str) -> Result<Option<Vec<u8>>> {
        match &self.tts {
            Some(tts) => Ok(Some(tts.synthesize(text).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::HashEmbedder;
    use crate::stores::{Collection, MemoryStore};
    use crate::testing::{MockBrowser, MockGenerator, MockSpeech};

    fn session(generator: Arc<MockGenerator>) -> ChatSession {
        let collection = Collection::new(
            Arc::new(MemoryStore::new()),
            Arc::new(HashEmbedder::default()),
            "website_content",
        );
        ChatSession::builder(Arc::new(MockBrowser::new()), collection, generator).build()
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_retrieval() {
        let generator = Arc::new(MockGenerator::new("unused"));
        let mut session = session(generator.clone());
        let speech = Arc::new(MockSpeech::new().with_transcript("   "));

        let reply = VoiceAssistant::new(speech).ask(&mut session, b"RIFF", "q.wav").await;
        assert_eq!(reply, VoiceReply::NotUnderstood);
        assert_eq!(reply.text(), NOT_UNDERSTOOD);
        assert!(session.history().is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_service_error_message() {
        let mut session = session(Arc::new(MockGenerator::new("unused")));
        let speech = Arc::new(MockSpeech::new().failing_transcription("network down"));

        let reply = VoiceAssistant::new(speech).ask(&mut session, b"RIFF", "q.wav").await;
        assert!(reply.text().starts_with("Could not request results; "));
        assert!(reply.text().contains("network down"));
    }

    #[tokio::test]
    async fn test_answer_is_spoken() {
        let mut session = session(Arc::new(MockGenerator::new("unused")));
        let speech = Arc::new(MockSpeech::new().with_transcript("what are your hours"));
        let assistant = VoiceAssistant::new(speech.clone()).with_speech(speech.clone());

        let reply = assistant.ask(&mut session, b"RIFF", "q.wav").await;
        match &reply {
            VoiceReply::Answered { transcript, audio, .. } => {
                assert_eq!(transcript, "what are your hours");
                assert_eq!(audio.as_deref(), Some(MockSpeech::AUDIO));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
        // empty store: the spoken reply is the no-content message
        assert_eq!(speech.spoken(), vec![reply.text().to_string()]);
        assert_eq!(session.history()[0].content, "🎤 what are your hours");
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_text() {
        let mut session = session(Arc::new(MockGenerator::new("unused")));
        let speech = Arc::new(
            MockSpeech::new()
                .with_transcript("hello")
                .failing_synthesis("tts quota"),
        );
        let assistant = VoiceAssistant::new(speech.clone()).with_speech(speech);

        match assistant.ask(&mut session, b"RIFF", "q.wav").await {
            VoiceReply::Answered { audio, .. } => assert!(audio.is_none()),
            other => panic!("unexpected reply: {:?}", other),
        }
    }
}
