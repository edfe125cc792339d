//! Wire types for the chat backend

use serde::{Deserialize, Serialize};

// ============================================================================
// Chat
// ============================================================================

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    /// Always present, `null` when nothing is attached
    pub file_id: Option<String>,
}

/// Body returned by `POST /chat`, on success or failure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Detected language of the user message
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Upload
// ============================================================================

/// Body returned by `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    /// Name the server stored the file under
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
