//! Desktop implementations of the widget capabilities.
//!
//! The clipboard goes through `arboard`. Audio and speech are handed to
//! external commands (`mpv`, `espeak-ng` by default) so the client carries
//! no audio stack of its own.

use async_trait::async_trait;
use chatline_core::{Clipboard, Error, Result, VoiceOutput, VoiceSettings};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::config::VoiceConfig;

/// espeak's default speaking rate in words per minute
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
/// espeak's default pitch on its 0-99 scale
const BASE_PITCH: f32 = 50.0;
/// How long a freshly started command is watched for an immediate failure
/// (unreachable URL, undecodable file, unknown voice)
const STARTUP_GRACE: Duration = Duration::from_millis(500);

// ============================================================================
// Clipboard
// ============================================================================

/// System clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard =
                arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| Error::Clipboard(e.to_string()))
        })
        .await
        .map_err(|e| Error::Clipboard(e.to_string()))?
    }
}

// ============================================================================
// Voice output
// ============================================================================

/// Plays audio and speaks text through external commands.
///
/// One child process at a time. [`stop`](VoiceOutput::stop) kills it.
#[derive(Debug)]
pub struct CommandVoiceOutput {
    player: String,
    synthesizer: String,
    child: Mutex<Option<Child>>,
}

impl CommandVoiceOutput {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            player: config.player.clone(),
            synthesizer: config.synthesizer.clone(),
            child: Mutex::new(None),
        }
    }

    /// Spawn `command` as the active output. Fails when it cannot be
    /// spawned or exits unsuccessfully within [`STARTUP_GRACE`].
    async fn start(&self, name: &str, mut command: Command) -> Result<()> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Playback(format!("{name}: {e}")))?;

        match tokio::time::timeout(STARTUP_GRACE, child.wait()).await {
            // Still running
            Err(_) => {}
            Ok(Ok(status)) if status.success() => {
                tracing::debug!("{} finished within the startup window", name);
                return Ok(());
            }
            Ok(Ok(status)) => {
                return Err(Error::Playback(format!("{name} exited with {status}")));
            }
            Ok(Err(e)) => return Err(Error::Playback(format!("{name}: {e}"))),
        }

        let previous = self.child.lock().await.replace(child);
        if let Some(mut previous) = previous {
            let _ = previous.kill().await;
        }
        Ok(())
    }
}

/// Arguments for an espeak-compatible synthesizer.
pub fn synthesizer_args(text: &str, settings: &VoiceSettings) -> Vec<String> {
    let words_per_minute = (BASE_WORDS_PER_MINUTE * settings.rate).round().max(1.0);
    let pitch = (BASE_PITCH * settings.pitch).round().clamp(0.0, 99.0);
    vec![
        "-v".to_string(),
        settings.lang.clone(),
        "-s".to_string(),
        format!("{}", words_per_minute as u32),
        "-p".to_string(),
        format!("{}", pitch as u32),
        "--".to_string(),
        text.to_string(),
    ]
}

#[async_trait]
impl VoiceOutput for CommandVoiceOutput {
    async fn speak(&self, text: &str, settings: &VoiceSettings) -> Result<()> {
        tracing::debug!("Speaking {} chars with {}", text.len(), self.synthesizer);
        let mut command = Command::new(&self.synthesizer);
        command.args(synthesizer_args(text, settings));
        self.start(&self.synthesizer, command).await
    }

    async fn play(&self, url: &str) -> Result<()> {
        tracing::debug!("Playing {} with {}", url, self.player);
        let mut command = Command::new(&self.player);
        command.arg(url);
        self.start(&self.player, command).await
    }

    async fn stop(&self) {
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!("Voice output already finished: {}", e);
            }
        }
    }
}
