//! Spoken questions and text-to-speech

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;

use ask_web::ai::OpenAI;
use ask_web::{VoiceAssistant, VoiceReply};

use crate::config::Config;
use crate::context::AppContext;

use super::print_reply;

fn speech_client(config: &Config) -> Result<Arc<OpenAI>> {
    Ok(Arc::new(OpenAI::new(config.require_openai_key()?.clone())))
}

/// Transcribe `audio`, answer it and optionally write the spoken answer.
pub async fn run(ctx: &mut AppContext, config: &Config, audio: &Path, speak: Option<&Path>) -> Result<()> {
    let client = speech_client(config)?;
    let mut assistant = VoiceAssistant::new(client.clone());
    if speak.is_some() {
        assistant = assistant.with_speech(client);
    }

    let bytes = tokio::fs::read(audio)
        .await
        .with_context(|| format!("Failed to read {}", audio.display()))?;
    let file_name = audio
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.wav");

    match assistant.ask(&mut ctx.session, &bytes, file_name).await {
        VoiceReply::Answered {
            transcript,
            reply,
            audio: spoken,
        } => {
            println!("{} {}", style("You said:").dim(), transcript);
            print_reply(&reply);
            match (speak, spoken) {
                (Some(out), Some(mp3)) => write_audio(ctx, out, &mp3).await?,
                (Some(_), None) => ctx.print_warning("Speech synthesis failed, no audio written"),
                _ => {}
            }
        }
        other => ctx.print_warning(other.text()),
    }
    Ok(())
}

/// Synthesize `text` into an mp3 file.
pub async fn speak(config: &Config, text: &str, out: &Path) -> Result<()> {
    let assistant = {
        let client = speech_client(config)?;
        VoiceAssistant::new(client.clone()).with_speech(client)
    };
    let audio = assistant
        .speak(text)
        .await
        .context("Speech synthesis failed")?
        .unwrap_or_default();

    tokio::fs::write(out, &audio)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("{}", style(format!("Wrote {} ({} bytes)", out.display(), audio.len())).green());
    Ok(())
}

async fn write_audio(ctx: &AppContext, out: &Path, mp3: &[u8]) -> Result<()> {
    tokio::fs::write(out, mp3)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    ctx.print_success(&format!("Spoken answer written to {}", out.display()));
    Ok(())
}
