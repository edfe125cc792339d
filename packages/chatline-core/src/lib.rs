//! Chatline Core - rendering and conversation library for the chat widget.
//!
//! This crate provides everything the widget needs that is not tied to a
//! particular platform:
//!
//! - **Rendering**: raw message text to escaped, markdown-lite HTML with
//!   copy-enabled code blocks
//! - **Conversation**: the per-conversation context holding the transcript,
//!   the attachment slot and the in-flight send
//! - **Capabilities**: transport, upload, voice and clipboard traits with
//!   stub implementations for headless use
//! - **Playback**: mutually exclusive voice output with synthesis fallback
//!
//! # Example
//!
//! ```rust
//! use chatline_core::render;
//!
//! let rendered = render("**hello** `world`");
//! assert!(rendered.as_str().contains("<strong>hello</strong>"));
//! assert!(rendered.as_str().contains("<code>world</code>"));
//! ```

pub mod attachment;
pub mod capability;
pub mod conversation;
pub mod i18n;
pub mod playback;
pub mod render;
pub mod speech;
pub mod transcript;
pub mod types;

// Re-export commonly used types
pub use types::{CodeBlock, FileRef, Message, Reply, Sender};

// Re-export main functionality
pub use attachment::{icon_class, AttachedFile, AttachmentSlot};
pub use capability::{ChatTransport, Clipboard, FileUploader, VoiceInput, VoiceOutput};
pub use conversation::{Capabilities, Conversation, ListenCanceller, Notice};
pub use i18n::I18n;
pub use playback::{ActiveStream, PlaybackController, VoiceSettings};
pub use render::{
    escape_html, render, render_with, unescape_html, CopyAllSource, RenderOptions,
    RenderedContent,
};
pub use speech::speech_text;
pub use transcript::{Transcript, TranscriptEntry};

/// Error types for chatline-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for chatline-core operations.
pub type Result<T> = std::result::Result<T, Error>;
