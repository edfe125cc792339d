//! Chat backend HTTP client implementation

use async_trait::async_trait;
use chatline_core::{ChatTransport, Error, FileRef, FileUploader, Reply, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::time::Duration;

use super::types::*;

/// HTTP client for the chat backend
#[derive(Debug, Clone)]
pub struct WidgetClient {
    base_url: String,
    client: Client,
}

impl WidgetClient {
    /// Create a new client with the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a relative URL returned by the server absolute
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    // ========================================================================
    // Internal HTTP Methods
    // ========================================================================

    /// Make a POST request with a JSON body
    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        read_json(response).await
    }

    /// Make a POST request with a multipart body
    async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        read_json(response).await
    }

    // ========================================================================
    // Chat API
    // ========================================================================

    /// Send a message, optionally referencing an uploaded file
    pub async fn chat(&self, message: &str, file: Option<&FileRef>) -> Result<Reply> {
        let request = ChatRequest {
            message: message.to_string(),
            file_id: file.map(|f| f.0.clone()),
        };
        tracing::debug!("POST /chat ({} chars, file: {:?})", message.len(), request.file_id);

        let response: ChatResponse = self.post("/chat", &request).await?;

        match (response.response, response.error) {
            (Some(text), error) => {
                if let Some(error) = error {
                    // The reply is usable, only its audio failed
                    tracing::warn!("Reply arrived without audio: {}", error);
                }
                Ok(Reply {
                    reply_text: text,
                    audio_url: response.audio_url.map(|url| self.resolve_url(&url)),
                })
            }
            (None, Some(error)) => Err(Error::Server(error)),
            (None, None) => Err(Error::Server("response missing reply text".to_string())),
        }
    }

    // ========================================================================
    // Upload API
    // ========================================================================

    /// Upload a file for use with a later message
    pub async fn upload(&self, path: &Path) -> Result<FileRef> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Upload(format!("invalid file name: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!("POST /upload {} ({} bytes)", file_name, bytes.len());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response: UploadResponse = self.post_multipart("/upload", form).await?;

        match (response.success, response.filename) {
            (true, Some(filename)) => Ok(FileRef(filename)),
            _ => Err(Error::Upload(response.error.unwrap_or_default())),
        }
    }
}

/// Decode a JSON body. Error statuses still carry a JSON body with an
/// `error` field, so the body is decoded whenever it parses.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    match serde_json::from_str(&text) {
        Ok(body) => Ok(body),
        Err(_) if !status.is_success() => Err(Error::Server(format!(
            "Request failed: {} {}",
            status,
            text.trim()
        ))),
        Err(e) => Err(Error::Json(e)),
    }
}

#[async_trait]
impl ChatTransport for WidgetClient {
    async fn send(&self, text: &str, file: Option<&FileRef>) -> Result<Reply> {
        self.chat(text, file).await
    }
}

#[async_trait]
impl FileUploader for WidgetClient {
    async fn upload(&self, path: &Path) -> Result<FileRef> {
        WidgetClient::upload(self, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WidgetClient {
        WidgetClient::new("http://127.0.0.1:5001/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        assert_eq!(client().base_url(), "http://127.0.0.1:5001");
    }

    #[test]
    fn test_resolve_relative_url() {
        assert_eq!(
            client().resolve_url("/audio/response_1.mp3"),
            "http://127.0.0.1:5001/audio/response_1.mp3"
        );
    }

    #[test]
    fn test_resolve_absolute_url() {
        assert_eq!(
            client().resolve_url("https://cdn.example.com/a.mp3"),
            "https://cdn.example.com/a.mp3"
        );
    }
}
