//! Per-conversation context.
//!
//! Everything the widget used to keep in globals (current attachment,
//! current audio, whether voice input works) lives here, scoped to one
//! conversation. Sends take `&mut self`, so a conversation has at most one
//! request in flight.

use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;

use crate::attachment::{check_upload, AttachedFile, AttachmentSlot, Rejection};
use crate::capability::{ChatTransport, Clipboard, FileUploader, VoiceInput, VoiceOutput};
use crate::i18n::I18n;
use crate::playback::{PlaybackController, VoiceSettings};
use crate::render::{unescape_html, RenderOptions};
use crate::transcript::{Transcript, TranscriptEntry};
use crate::types::Message;
use crate::{Error, Result};

/// A message for the user outside the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Transient status, e.g. "Copied!"
    Info(String),
    /// Needs acknowledging, e.g. a failed upload
    Alert(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Alert(text) => text,
        }
    }
}

/// The platform services a conversation talks to.
#[derive(Clone)]
pub struct Capabilities {
    pub transport: Arc<dyn ChatTransport>,
    pub uploader: Arc<dyn FileUploader>,
    pub voice_input: Arc<dyn VoiceInput>,
    pub voice_output: Arc<dyn VoiceOutput>,
    pub clipboard: Arc<dyn Clipboard>,
}

/// Stops recognition started by [`Conversation::listen`]. The listen call
/// then returns `None` without sending anything.
#[derive(Clone)]
pub struct ListenCanceller {
    voice_input: Arc<dyn VoiceInput>,
}

impl ListenCanceller {
    pub fn cancel(&self) {
        self.voice_input.cancel();
    }
}

impl std::fmt::Debug for ListenCanceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenCanceller").finish_non_exhaustive()
    }
}

/// One active conversation.
pub struct Conversation {
    capabilities: Capabilities,
    i18n: I18n,
    transcript: Transcript,
    attachment: AttachmentSlot,
    playback: PlaybackController,
    voice_input_enabled: bool,
    notices: Vec<Notice>,
}

impl Conversation {
    /// Start a conversation. The transcript opens with the bot's greeting.
    pub fn new(
        capabilities: Capabilities,
        i18n: I18n,
        render: RenderOptions,
        voice: VoiceSettings,
    ) -> Self {
        let playback = PlaybackController::new(Arc::clone(&capabilities.voice_output), voice);
        let mut transcript = Transcript::new(render);
        transcript.push(Message::bot(&i18n.t("chat.welcome"), None));

        Self {
            capabilities,
            i18n,
            transcript,
            attachment: AttachmentSlot::new(),
            playback,
            voice_input_enabled: true,
            notices: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn attachment(&self) -> Option<&AttachedFile> {
        self.attachment.current()
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn voice_input_enabled(&self) -> bool {
        self.voice_input_enabled
    }

    /// Drain pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send a message with the current attachment.
    ///
    /// Returns the bot entry appended in response: the reply, or the
    /// localized apology when the transport fails. Does nothing when there
    /// is neither text nor an attachment.
    pub async fn send(&mut self, text: &str) -> Option<&TranscriptEntry> {
        let text = text.trim();
        if text.is_empty() && self.attachment.is_empty() {
            return None;
        }

        self.transcript.push(Message::user(text));

        let file = self.attachment.file_ref().cloned();
        let bot_message = match self.capabilities.transport.send(text, file.as_ref()).await {
            Ok(reply) => {
                if let Some(removed) = self.attachment.remove() {
                    tracing::debug!("Cleared attachment {} after send", removed.display_name);
                }
                Message::bot(&reply.reply_text, reply.audio_url)
            }
            Err(e) => {
                tracing::error!("Failed to send message: {}", e);
                Message::bot(&self.i18n.t("chat.error_fallback"), None)
            }
        };

        Some(self.transcript.push(bot_message))
    }

    // ========================================================================
    // Attachments
    // ========================================================================

    /// Upload a file and make it the attachment for the next send.
    pub async fn attach(&mut self, path: &Path) -> Option<&AttachedFile> {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let size = match std::fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::error!("Cannot read {}: {}", path.display(), e);
                self.alert(self.i18n.t("upload.error"));
                return None;
            }
        };

        if let Err(rejection) = check_upload(&display_name, size) {
            let key = match rejection {
                Rejection::TypeNotAllowed => "upload.type_not_allowed",
                Rejection::TooLarge => "upload.too_large",
            };
            self.alert(self.i18n.format(key, &[("name", display_name.as_str())]));
            return None;
        }

        match self.capabilities.uploader.upload(path).await {
            Ok(file_ref) => {
                tracing::info!("Attached {} as {}", display_name, file_ref);
                self.notices.push(Notice::Info(
                    self.i18n.format("upload.attached", &[("name", display_name.as_str())]),
                ));
                self.attachment.attach(AttachedFile::new(file_ref, &display_name));
                self.attachment.current()
            }
            Err(Error::Upload(message)) if !message.is_empty() => {
                tracing::warn!("Upload rejected: {}", message);
                self.alert(message);
                None
            }
            Err(Error::Upload(_)) => {
                self.alert(self.i18n.t("upload.failed"));
                None
            }
            Err(e) => {
                tracing::error!("Upload error: {}", e);
                self.alert(self.i18n.t("upload.error"));
                None
            }
        }
    }

    /// Drop the current attachment.
    pub fn detach(&mut self) -> Option<AttachedFile> {
        self.attachment.remove()
    }

    // ========================================================================
    // Voice
    // ========================================================================

    /// Listen for one utterance and send it.
    ///
    /// The first time the platform reports that recognition is unsupported
    /// the user is alerted and voice input stays off for this conversation.
    pub async fn listen(&mut self) -> Option<&TranscriptEntry> {
        if !self.voice_input_enabled {
            return None;
        }

        let mut transcripts = match self.capabilities.voice_input.listen() {
            Ok(stream) => stream,
            Err(Error::Unsupported(what)) => {
                tracing::warn!("Voice input disabled: {} unsupported", what);
                self.voice_input_enabled = false;
                self.alert(self.i18n.t("voice.unsupported"));
                return None;
            }
            Err(e) => {
                tracing::error!("Error starting speech recognition: {}", e);
                return None;
            }
        };

        self.notices.push(Notice::Info(self.i18n.t("voice.listening")));

        match transcripts.next().await {
            Some(Ok(transcript)) => self.send(&transcript).await,
            Some(Err(e)) => {
                tracing::error!("Speech recognition error: {}", e);
                None
            }
            None => {
                tracing::debug!("Listening ended without a transcript");
                None
            }
        }
    }

    /// A handle that stops an ongoing [`listen`](Self::listen). Take it
    /// before awaiting, since `listen` borrows the conversation.
    pub fn listen_canceller(&self) -> ListenCanceller {
        ListenCanceller {
            voice_input: Arc::clone(&self.capabilities.voice_input),
        }
    }

    /// Voice the transcript entry at `index`: its audio when present,
    /// synthesized speech otherwise.
    pub async fn play_entry(&mut self, index: usize) -> Result<()> {
        let Some(entry) = self.transcript.entries().get(index) else {
            tracing::debug!("No transcript entry at {}", index);
            return Ok(());
        };
        let message = &entry.message;
        self.playback
            .play_reply(message.audio_url.as_deref(), &message.raw_text)
            .await?;
        Ok(())
    }

    pub async fn stop_playback(&mut self) {
        self.playback.stop().await;
    }

    // ========================================================================
    // Clipboard
    // ========================================================================

    /// Copy code block `block` of entry `index`.
    pub async fn copy_code(&mut self, index: usize, block: usize) -> Result<()> {
        let code = self
            .transcript
            .entries()
            .get(index)
            .and_then(|entry| entry.rendered.code_blocks().get(block))
            .map(|code_block| unescape_html(&code_block.code));
        match code {
            Some(code) => self.copy(&code).await,
            None => Ok(()),
        }
    }

    /// Copy what the whole-message control of entry `index` is bound to.
    pub async fn copy_message(&mut self, index: usize) -> Result<()> {
        let text = self
            .transcript
            .entries()
            .get(index)
            .map(|entry| entry.rendered.copy_all_text().to_string());
        match text {
            Some(text) => self.copy(&text).await,
            None => Ok(()),
        }
    }

    async fn copy(&mut self, text: &str) -> Result<()> {
        match self.capabilities.clipboard.write_text(text).await {
            Ok(()) => {
                self.notices.push(Notice::Info(self.i18n.t("clipboard.copied")));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to copy text: {}", e);
                self.alert(self.i18n.t("clipboard.failed"));
                Err(e)
            }
        }
    }

    fn alert(&mut self, text: String) {
        self.notices.push(Notice::Alert(text));
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("messages", &self.transcript.len())
            .field("attachment", &self.attachment.current())
            .field("voice_input_enabled", &self.voice_input_enabled)
            .finish_non_exhaustive()
    }
}
