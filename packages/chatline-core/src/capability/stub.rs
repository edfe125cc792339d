//! In-memory capability implementations for headless hosts and tests.

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::StreamExt;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{ChatTransport, Clipboard, FileUploader, TranscriptStream, VoiceInput, VoiceOutput};
use crate::playback::VoiceSettings;
use crate::types::{FileRef, Reply};
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Transport
// ============================================================================

/// A request seen by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub text: String,
    pub file: Option<FileRef>,
}

/// Transport that answers from a queue of prepared results.
///
/// An exhausted queue answers with a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Reply>>>,
    requests: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, text: &str, audio_url: Option<&str>) -> Self {
        lock(&self.replies).push_back(Ok(Reply {
            reply_text: text.to_string(),
            audio_url: audio_url.map(str::to_string),
        }));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: Error) -> Self {
        lock(&self.replies).push_back(Err(error));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<SentRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(&self, text: &str, file: Option<&FileRef>) -> Result<Reply> {
        lock(&self.requests).push(SentRequest {
            text: text.to_string(),
            file: file.cloned(),
        });
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("no scripted reply left".to_string())))
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Uploader that names the stored file after the local file name.
#[derive(Debug, Default)]
pub struct StubUploader {
    failure: Option<String>,
}

impl StubUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl FileUploader for StubUploader {
    async fn upload(&self, path: &Path) -> Result<FileRef> {
        if let Some(message) = &self.failure {
            return Err(Error::Upload(message.clone()));
        }
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Upload(format!("invalid file name: {}", path.display())))?;
        Ok(FileRef(format!("stub_{name}")))
    }
}

// ============================================================================
// Voice input
// ============================================================================

/// Voice input for platforms without a recognizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedVoiceInput;

impl VoiceInput for UnsupportedVoiceInput {
    fn listen(&self) -> Result<TranscriptStream> {
        Err(Error::Unsupported("speech recognition".to_string()))
    }

    fn cancel(&self) {}
}

/// Voice input that "hears" a fixed transcript or error, or nothing at all.
#[derive(Debug, Clone)]
pub struct ScriptedVoiceInput {
    /// `None` listens until cancelled
    outcome: Option<std::result::Result<String, String>>,
    session: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl ScriptedVoiceInput {
    fn with_outcome(outcome: Option<std::result::Result<String, String>>) -> Self {
        Self {
            outcome,
            session: Arc::default(),
        }
    }

    pub fn hearing(transcript: &str) -> Self {
        Self::with_outcome(Some(Ok(transcript.to_string())))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Some(Err(message.to_string())))
    }

    /// Keeps listening until [`cancel`](VoiceInput::cancel) is called.
    pub fn silent() -> Self {
        Self::with_outcome(None)
    }
}

impl VoiceInput for ScriptedVoiceInput {
    fn listen(&self) -> Result<TranscriptStream> {
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        *lock(&self.session) = Some(cancel_tx);
        let outcome = self.outcome.clone();

        let stream = async_stream::stream! {
            let Some(outcome) = outcome else {
                let _ = cancel_rx.await;
                return;
            };
            if let Ok(Some(())) = cancel_rx.try_recv() {
                return;
            }
            match outcome {
                Ok(transcript) => yield Ok(transcript),
                Err(message) => yield Err(Error::Recognition(message)),
            }
        };
        Ok(stream.boxed())
    }

    fn cancel(&self) {
        if let Some(cancel_tx) = lock(&self.session).take() {
            let _ = cancel_tx.send(());
        }
    }
}

// ============================================================================
// Voice output
// ============================================================================

/// What a [`RecordingVoiceOutput`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Speak { text: String, lang: String },
    Play(String),
    Stop,
}

/// Voice output that records calls instead of producing sound.
#[derive(Debug, Default)]
pub struct RecordingVoiceOutput {
    events: Mutex<Vec<OutputEvent>>,
    fail_playback: bool,
}

impl RecordingVoiceOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `play` call fails with a playback error.
    pub fn with_broken_player() -> Self {
        Self {
            events: Mutex::default(),
            fail_playback: true,
        }
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl VoiceOutput for RecordingVoiceOutput {
    async fn speak(&self, text: &str, settings: &VoiceSettings) -> Result<()> {
        lock(&self.events).push(OutputEvent::Speak {
            text: text.to_string(),
            lang: settings.lang.clone(),
        });
        Ok(())
    }

    async fn play(&self, url: &str) -> Result<()> {
        lock(&self.events).push(OutputEvent::Play(url.to_string()));
        if self.fail_playback {
            return Err(Error::Playback(format!("cannot play {url}")));
        }
        Ok(())
    }

    async fn stop(&self) {
        lock(&self.events).push(OutputEvent::Stop);
    }
}

// ============================================================================
// Clipboard
// ============================================================================

/// Clipboard held in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    denied: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that refuses every write.
    pub fn denied() -> Self {
        Self {
            contents: Mutex::default(),
            denied: true,
        }
    }

    pub fn contents(&self) -> Option<String> {
        lock(&self.contents).clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.denied {
            return Err(Error::Clipboard("write denied".to_string()));
        }
        *lock(&self.contents) = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_voice_input_yields_once() {
        let input = ScriptedVoiceInput::hearing("xin chào");
        let transcripts: Vec<_> = input.listen().unwrap().collect().await;
        assert_eq!(transcripts.len(), 1);
        assert_eq!(transcripts[0].as_ref().unwrap(), "xin chào");
    }

    #[tokio::test]
    async fn test_cancelled_listen_yields_nothing() {
        let input = ScriptedVoiceInput::hearing("ignored");
        let stream = input.listen().unwrap();
        input.cancel();
        let transcripts: Vec<_> = stream.collect().await;
        assert!(transcripts.is_empty());
    }

    #[tokio::test]
    async fn test_silent_listen_ends_when_cancelled() {
        let input = ScriptedVoiceInput::silent();
        let mut stream = input.listen().unwrap();
        let canceller = input.clone();

        let (first, ()) = tokio::join!(stream.next(), async move { canceller.cancel() });
        assert!(first.is_none());
    }

    #[tokio::test]
    async fn test_recognition_error_is_reported() {
        let input = ScriptedVoiceInput::failing("no-speech");
        let mut stream = input.listen().unwrap();
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(Error::Recognition(m)) if m == "no-speech"));
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_unsupported_voice_input() {
        assert!(matches!(
            UnsupportedVoiceInput.listen(),
            Err(Error::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_scripted_transport_records_requests() {
        let transport = ScriptedTransport::new().reply("hi", None);
        let file = FileRef("a.txt".to_string());

        let reply = transport.send("hello", Some(&file)).await.unwrap();
        assert_eq!(reply.reply_text, "hi");
        assert!(transport.send("again", None).await.is_err());

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].file, Some(file));
    }

    #[tokio::test]
    async fn test_memory_clipboard() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("copied").await.unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("copied"));

        assert!(MemoryClipboard::denied().write_text("x").await.is_err());
    }

    #[tokio::test]
    async fn test_stub_uploader_names_file() {
        let file = StubUploader::new().upload(Path::new("/tmp/report.pdf")).await.unwrap();
        assert_eq!(file.as_str(), "stub_report.pdf");
    }
}
