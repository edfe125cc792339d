//! Plain text for speech synthesis.

use pulldown_cmark::{Event, Parser, TagEnd};

/// Strip markdown markers and HTML tags from message text so a synthesizer
/// reads only the words. Whitespace is collapsed to single spaces.
pub fn speech_text(text: &str) -> String {
    let mut spoken = String::with_capacity(text.len());

    for event in Parser::new(text) {
        match event {
            Event::Text(t) | Event::Code(t) => spoken.push_str(&t),
            // Tags go, the text between them stays
            Event::Html(html) | Event::InlineHtml(html) => push_without_tags(&html, &mut spoken),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock) => {
                spoken.push(' ')
            }
            _ => {}
        }
    }

    spoken.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `html` with every `<...>` tag removed. A `<` with no closing `>`
/// is kept as text.
fn push_without_tags(html: &str, out: &mut String) {
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_emphasis_and_code() {
        assert_eq!(speech_text("**Hello** *there* `world`"), "Hello there world");
    }

    #[test]
    fn test_strips_html_tags() {
        assert_eq!(speech_text("<b>bold</b> text"), "bold text");
    }

    #[test]
    fn test_html_block_keeps_inner_text() {
        assert_eq!(speech_text("<div>Xin chào bạn</div>"), "Xin chào bạn");
    }

    #[test]
    fn test_html_block_keeps_following_lines() {
        assert_eq!(
            speech_text("<p>Step one</p>\nthen run it"),
            "Step one then run it"
        );
    }

    #[test]
    fn test_unclosed_angle_bracket_is_spoken() {
        assert_eq!(speech_text("<div>a < b"), "a < b");
    }

    #[test]
    fn test_keeps_code_block_text() {
        assert_eq!(speech_text("Run:\n\n```sh\nls -la\n```"), "Run: ls -la");
    }

    #[test]
    fn test_lines_are_joined() {
        assert_eq!(speech_text("one\ntwo\n\nthree"), "one two three");
    }

    #[test]
    fn test_emphasis_inside_word_does_not_split_it() {
        assert_eq!(speech_text("un**believ**able"), "unbelievable");
    }

    #[test]
    fn test_empty() {
        assert_eq!(speech_text(""), "");
    }
}
