//! The append-only transcript and its markup.

use crate::render::{escape_html, render_with, RenderOptions, RenderedContent};
use crate::types::{Message, Sender};

/// A message together with its rendered content.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub message: Message,
    pub rendered: RenderedContent,
}

impl TranscriptEntry {
    /// Full message markup: meta line, content and, for bot messages, the
    /// audio controls.
    pub fn markup(&self) -> String {
        let message = &self.message;
        let mut html = format!(
            r#"<div class="message {}"><div class="message-meta"><strong>{}</strong><span>{}</span></div><div class="message-content">{}</div>"#,
            message.sender.css_class(),
            message.sender.label(),
            message.timestamp.format("%H:%M:%S"),
            self.rendered
        );

        if message.sender == Sender::Bot {
            html.push_str(r#"<div class="audio-controls"><button class="btn btn-icon""#);
            if let Some(url) = &message.audio_url {
                html.push_str(r#" data-audio-url=""#);
                html.push_str(&escape_html(url));
                html.push('"');
            }
            html.push_str(r#"><i class="fas fa-volume-up"></i></button><button class="btn btn-icon hidden"><i class="fas fa-stop"></i></button></div>"#);
        }

        html.push_str("</div>");
        html
    }
}

/// Messages of one conversation, in the order they were appended.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    options: RenderOptions,
}

impl Transcript {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            entries: Vec::new(),
            options,
        }
    }

    /// Render and append a message.
    pub fn push(&mut self, message: Message) -> &TranscriptEntry {
        let rendered = render_with(&message.raw_text, &self.options);
        self.entries.push(TranscriptEntry { message, rendered });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Standalone page containing every message, with syntax highlighting
    /// run over the `language-*` code containers on load.
    pub fn to_html_document(&self, title: &str) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        html.push_str(concat!(
            "<link rel=\"stylesheet\" href=\"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/themes/prism.min.css\">\n",
            "<link rel=\"stylesheet\" href=\"https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css\">\n",
            "<script src=\"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/prism.min.js\"></script>\n",
            "<script src=\"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/plugins/autoloader/prism-autoloader.min.js\"></script>\n",
            "<script>function copyText(t){navigator.clipboard.writeText(t).catch(function(){alert('Failed to copy text');});}</script>\n",
        ));
        html.push_str("</head><body><div id=\"chat-box\">\n");
        for entry in &self.entries {
            html.push_str(&entry.markup());
            html.push('\n');
        }
        html.push_str("</div></body></html>\n");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at_noon(message: Message) -> Message {
        let noon = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap();
        message.at(noon)
    }

    #[test]
    fn test_user_markup() {
        let mut transcript = Transcript::default();
        let entry = transcript.push(at_noon(Message::user("**hi**")));
        let html = entry.markup();

        assert!(html.starts_with(r#"<div class="message user-message">"#));
        assert!(html.contains("<strong>You</strong><span>12:30:05</span>"));
        assert!(html.contains("<strong>hi</strong>"));
        assert!(!html.contains("audio-controls"));
    }

    #[test]
    fn test_bot_markup_carries_audio_url() {
        let mut transcript = Transcript::default();
        let entry = transcript.push(Message::bot("reply", Some("/audio/r.mp3".to_string())));
        let html = entry.markup();

        assert!(html.contains("bot-message"));
        assert!(html.contains(r#"data-audio-url="/audio/r.mp3""#));
        assert!(html.contains("fa-stop"));
    }

    #[test]
    fn test_entries_are_appended_in_order() {
        let mut transcript = Transcript::default();
        transcript.push(Message::user("one"));
        transcript.push(Message::bot("two", None));

        let texts: Vec<_> = transcript
            .entries()
            .iter()
            .map(|entry| entry.message.raw_text.as_str())
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(transcript.last().unwrap().message.sender, Sender::Bot);
    }

    #[test]
    fn test_document_contains_every_message() {
        let mut transcript = Transcript::default();
        transcript.push(Message::user("question <1>"));
        transcript.push(Message::bot("```rs\nfn x() {}\n```", None));

        let document = transcript.to_html_document("Chat & notes");
        assert!(document.contains("<title>Chat &amp; notes</title>"));
        assert!(document.contains("question &lt;1&gt;"));
        assert!(document.contains(r#"class="language-rs""#));
        assert!(document.ends_with("</html>\n"));
    }
}
