//! File attachment state for the prompt.
//!
//! A conversation holds at most one attachment. Attaching a new file
//! replaces the previous one and its preview.

use std::path::Path;

use crate::render::escape_html;
use crate::types::FileRef;

/// Extensions the chat backend accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "png", "jpg", "jpeg", "csv", "xlsx", "docx"];

/// Upload size ceiling enforced by the backend.
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Why a file was rejected before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TypeNotAllowed,
    TooLarge,
}

/// An uploaded file waiting to be sent with the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    /// Name the server stored the file under
    pub file_ref: FileRef,
    /// Local name shown in the preview
    pub display_name: String,
}

impl AttachedFile {
    pub fn new(file_ref: FileRef, display_name: &str) -> Self {
        Self {
            file_ref,
            display_name: display_name.to_string(),
        }
    }

    /// Preview chip shown above the input, with a remove control.
    pub fn preview_markup(&self) -> String {
        format!(
            r#"<div class="file-preview"><i class="fas {}"></i><span>{}</span><button class="btn btn-icon" onclick="removeFile()"><i class="fas fa-times"></i></button></div>"#,
            icon_class(&self.display_name),
            escape_html(&self.display_name)
        )
    }
}

/// Single-slot attachment holder.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSlot {
    current: Option<AttachedFile>,
}

impl AttachmentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a file, returning the one it replaced.
    pub fn attach(&mut self, file: AttachedFile) -> Option<AttachedFile> {
        let previous = self.current.replace(file);
        if let Some(previous) = &previous {
            tracing::debug!("Replacing attachment {}", previous.display_name);
        }
        previous
    }

    pub fn remove(&mut self) -> Option<AttachedFile> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&AttachedFile> {
        self.current.as_ref()
    }

    pub fn file_ref(&self) -> Option<&FileRef> {
        self.current.as_ref().map(|file| &file.file_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Font Awesome icon class for a file name.
pub fn icon_class(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("pdf") => "fa-file-pdf",
        Some("txt") => "fa-file-alt",
        Some("doc" | "docx") => "fa-file-word",
        Some("xls" | "xlsx") => "fa-file-excel",
        Some("png" | "jpg" | "jpeg" | "gif") => "fa-file-image",
        Some("csv") => "fa-file-csv",
        _ => "fa-file",
    }
}

/// Check a file against the backend's type and size limits.
pub fn check_upload(filename: &str, size: u64) -> Result<(), Rejection> {
    let allowed = extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    if !allowed {
        return Err(Rejection::TypeNotAllowed);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(Rejection::TooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(name: &str) -> AttachedFile {
        AttachedFile::new(FileRef(format!("20240101_{name}")), name)
    }

    #[test]
    fn test_icon_mapping() {
        assert_eq!(icon_class("report.PDF"), "fa-file-pdf");
        assert_eq!(icon_class("notes.txt"), "fa-file-alt");
        assert_eq!(icon_class("a.docx"), "fa-file-word");
        assert_eq!(icon_class("sheet.xls"), "fa-file-excel");
        assert_eq!(icon_class("photo.jpeg"), "fa-file-image");
        assert_eq!(icon_class("data.csv"), "fa-file-csv");
        assert_eq!(icon_class("archive.zip"), "fa-file");
        assert_eq!(icon_class("README"), "fa-file");
    }

    #[test]
    fn test_attach_replaces_previous() {
        let mut slot = AttachmentSlot::new();
        assert!(slot.attach(attached("a.txt")).is_none());

        let replaced = slot.attach(attached("b.pdf")).unwrap();
        assert_eq!(replaced.display_name, "a.txt");
        assert_eq!(slot.current().unwrap().display_name, "b.pdf");
        assert_eq!(slot.file_ref().unwrap().as_str(), "20240101_b.pdf");
    }

    #[test]
    fn test_remove_clears_slot() {
        let mut slot = AttachmentSlot::new();
        slot.attach(attached("a.txt"));
        assert!(slot.remove().is_some());
        assert!(slot.is_empty());
        assert!(slot.remove().is_none());
    }

    #[test]
    fn test_preview_escapes_name() {
        let markup = attached("<img src=x>.png").preview_markup();
        assert!(markup.contains("fa-file-image"));
        assert!(markup.contains("&lt;img src=x&gt;.png"));
        assert!(!markup.contains("<img"));
    }

    #[test]
    fn test_check_upload() {
        assert_eq!(check_upload("a.TXT", 10), Ok(()));
        assert_eq!(check_upload("a.exe", 10), Err(Rejection::TypeNotAllowed));
        assert_eq!(check_upload("noext", 10), Err(Rejection::TypeNotAllowed));
        assert_eq!(
            check_upload("big.pdf", MAX_UPLOAD_BYTES + 1),
            Err(Rejection::TooLarge)
        );
    }
}
