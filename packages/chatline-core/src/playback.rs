//! Voice output coordination.
//!
//! At most one audio or speech stream is active per conversation. Starting a
//! new one stops the previous, and a reply whose audio cannot be played is
//! spoken by the synthesizer instead.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::capability::VoiceOutput;
use crate::speech::speech_text;
use crate::Result;

/// Synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// BCP 47 language tag
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            lang: "vi-VN".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// The stream most recently started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveStream {
    Audio(String),
    Speech,
}

/// Owns the voice output for one conversation.
pub struct PlaybackController {
    output: Arc<dyn VoiceOutput>,
    settings: VoiceSettings,
    active: Option<ActiveStream>,
}

impl PlaybackController {
    pub fn new(output: Arc<dyn VoiceOutput>, settings: VoiceSettings) -> Self {
        Self {
            output,
            settings,
            active: None,
        }
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }

    pub fn active(&self) -> Option<&ActiveStream> {
        self.active.as_ref()
    }

    /// Voice a bot reply: its audio when there is some, synthesis otherwise
    /// or when the audio fails to play.
    pub async fn play_reply(&mut self, audio_url: Option<&str>, text: &str) -> Result<&ActiveStream> {
        match audio_url {
            Some(url) => self.play(url, text).await,
            None => self.speak(text).await,
        }
    }

    /// Play an audio URL, falling back to speaking `fallback_text`.
    pub async fn play(&mut self, url: &str, fallback_text: &str) -> Result<&ActiveStream> {
        self.stop().await;

        match self.output.play(url).await {
            Ok(()) => {
                tracing::debug!("Playing audio {}", url);
                Ok(self.active.insert(ActiveStream::Audio(url.to_string())))
            }
            Err(e) => {
                tracing::warn!("Audio playback failed, falling back to synthesis: {}", e);
                self.speak(fallback_text).await
            }
        }
    }

    /// Speak message text. Markdown markers and tags are stripped first.
    pub async fn speak(&mut self, text: &str) -> Result<&ActiveStream> {
        self.stop().await;

        let spoken = speech_text(text);
        self.output.speak(&spoken, &self.settings).await?;
        Ok(self.active.insert(ActiveStream::Speech))
    }

    /// Stop whatever is playing.
    pub async fn stop(&mut self) {
        if self.active.take().is_some() {
            self.output.stop().await;
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("settings", &self.settings)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
