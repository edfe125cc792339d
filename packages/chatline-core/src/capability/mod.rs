//! Platform capabilities the widget depends on.
//!
//! Each capability is a trait so hosts can plug in platform implementations
//! (HTTP transport, system clipboard, audio player) while tests and headless
//! hosts use the stubs in [`stub`].

pub mod stub;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::Path;

use crate::playback::VoiceSettings;
use crate::types::{FileRef, Reply};
use crate::Result;

/// Sends a user message to the chat backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `text` with an optional attachment reference.
    ///
    /// Fails with [`Error::Network`](crate::Error::Network) when the backend
    /// cannot be reached and [`Error::Server`](crate::Error::Server) when it
    /// answers with an error.
    async fn send(&self, text: &str, file: Option<&FileRef>) -> Result<Reply>;
}

/// Uploads a file so it can be referenced by a later send.
#[async_trait]
pub trait FileUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<FileRef>;
}

/// Transcripts produced by one listening session.
pub type TranscriptStream = BoxStream<'static, Result<String>>;

/// Speech-to-text.
pub trait VoiceInput: Send + Sync {
    /// Start listening.
    ///
    /// The returned stream is lazy and yields at most one transcript.
    /// Platforms without a recognizer fail with
    /// [`Error::Unsupported`](crate::Error::Unsupported).
    fn listen(&self) -> Result<TranscriptStream>;

    /// Cancel the active listening session, if any. The stream then ends
    /// without a transcript.
    fn cancel(&self);
}

/// Audio playback and speech synthesis.
///
/// Both calls return once output has started. Callers are responsible for
/// stopping the previous stream first; [`PlaybackController`](crate::PlaybackController)
/// does that.
#[async_trait]
pub trait VoiceOutput: Send + Sync {
    async fn speak(&self, text: &str, settings: &VoiceSettings) -> Result<()>;

    async fn play(&self, url: &str) -> Result<()>;

    async fn stop(&self);
}

/// Text clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}
