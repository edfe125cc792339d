//! Core data types for the chat widget.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    #[default]
    User,
    Bot,
}

impl Sender {
    /// Label shown in the message meta line.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "Bot",
        }
    }

    /// CSS class of the message container.
    pub fn css_class(&self) -> &'static str {
        match self {
            Sender::User => "user-message",
            Sender::Bot => "bot-message",
        }
    }
}

/// A single chat message as it was sent or received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub sender: Sender,
    pub raw_text: String,
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl Message {
    /// Create a user message stamped with the current local time.
    pub fn user(text: &str) -> Self {
        Self {
            sender: Sender::User,
            raw_text: text.to_string(),
            timestamp: Local::now(),
            audio_url: None,
        }
    }

    /// Create a bot message stamped with the current local time.
    pub fn bot(text: &str, audio_url: Option<String>) -> Self {
        Self {
            sender: Sender::Bot,
            raw_text: text.to_string(),
            timestamp: Local::now(),
            audio_url,
        }
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A fenced code block pulled out of a message during rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag from the opening fence, `plaintext` when absent
    pub language: String,
    /// Trimmed body, already HTML-escaped
    pub code: String,
}

impl CodeBlock {
    pub const DEFAULT_LANGUAGE: &'static str = "plaintext";

    pub fn new(language: Option<&str>, code: &str) -> Self {
        Self {
            language: language
                .filter(|lang| !lang.is_empty())
                .unwrap_or(Self::DEFAULT_LANGUAGE)
                .to_string(),
            code: code.trim().to_string(),
        }
    }
}

/// Server-side name of an uploaded file, passed back as `file_id` on send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successful reply from the chat backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    pub reply_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}
