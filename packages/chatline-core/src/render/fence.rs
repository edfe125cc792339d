//! Fenced code block extraction.
//!
//! Splits escaped message text into plain text segments and code block
//! markers. A fence is three backticks, an optional word-character language
//! tag, a newline, a body, and the next three backticks. Anything that does
//! not complete that shape is left in the text untouched.

use crate::types::CodeBlock;

const FENCE: &str = "```";

/// One piece of a message after fence extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    /// Position of the block in the extracted list
    Fence(usize),
}

/// Extract fenced blocks from already-escaped text, in order of appearance.
pub(crate) fn extract(escaped: &str) -> (Vec<Segment<'_>>, Vec<CodeBlock>) {
    let mut segments = Vec::new();
    let mut blocks = Vec::new();
    let mut text_start = 0;
    let mut search = 0;

    while let Some(offset) = escaped[search..].find(FENCE) {
        let open = search + offset;
        match match_fence(escaped, open) {
            Some((language, body, end)) => {
                if open > text_start {
                    segments.push(Segment::Text(&escaped[text_start..open]));
                }
                segments.push(Segment::Fence(blocks.len()));
                blocks.push(CodeBlock::new(language, body));
                text_start = end;
                search = end;
            }
            // Backtick is one byte, so this stays on a char boundary
            None => search = open + 1,
        }
    }

    if text_start < escaped.len() {
        segments.push(Segment::Text(&escaped[text_start..]));
    }

    (segments, blocks)
}

/// Try to match a complete fence starting at `open`.
///
/// Returns the language tag, the raw body and the byte offset just past the
/// closing fence.
fn match_fence(text: &str, open: usize) -> Option<(Option<&str>, &str, usize)> {
    let after_open = open + FENCE.len();
    let tag_len = text[after_open..]
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let tag_end = after_open + tag_len;

    if text.as_bytes().get(tag_end) != Some(&b'\n') {
        return None;
    }

    let body_start = tag_end + 1;
    let close = body_start + text[body_start..].find(FENCE)?;
    let language = (tag_len > 0).then(|| &text[after_open..tag_end]);

    Some((language, &text[body_start..close], close + FENCE.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block_with_language() {
        let (segments, blocks) = extract("```js\nconsole.log(1)\n```");
        assert_eq!(segments, vec![Segment::Fence(0)]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "js");
        assert_eq!(blocks[0].code, "console.log(1)");
    }

    #[test]
    fn test_text_around_blocks_is_preserved() {
        let (segments, blocks) = extract("before\n```\nx\n```\nafter");
        assert_eq!(
            segments,
            vec![
                Segment::Text("before\n"),
                Segment::Fence(0),
                Segment::Text("\nafter"),
            ]
        );
        assert_eq!(blocks[0].language, "plaintext");
    }

    #[test]
    fn test_two_blocks_in_order() {
        let (segments, blocks) = extract("```py\na\n```mid```rs\nb\n```");
        assert_eq!(
            segments,
            vec![Segment::Fence(0), Segment::Text("mid"), Segment::Fence(1)]
        );
        assert_eq!(blocks[0].language, "py");
        assert_eq!(blocks[0].code, "a");
        assert_eq!(blocks[1].language, "rs");
        assert_eq!(blocks[1].code, "b");
    }

    #[test]
    fn test_unterminated_fence_stays_literal() {
        let (segments, blocks) = extract("```js\nnever closed");
        assert!(blocks.is_empty());
        assert_eq!(segments, vec![Segment::Text("```js\nnever closed")]);
    }

    #[test]
    fn test_language_must_be_followed_by_newline() {
        // `c++` is not a word, so the opener never matches
        let (_, blocks) = extract("```c++\nint x;\n```");
        assert!(blocks.is_empty());

        let (_, blocks) = extract("``` js\nx\n```");
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_extra_leading_backtick_stays_in_text() {
        let (segments, blocks) = extract("````\nx\n```");
        assert_eq!(segments, vec![Segment::Text("`"), Segment::Fence(0)]);
        assert_eq!(blocks[0].code, "x");
    }

    #[test]
    fn test_body_stops_at_first_closing_fence() {
        let (segments, blocks) = extract("```\na\n```b```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].code, "a");
        assert_eq!(segments, vec![Segment::Fence(0), Segment::Text("b```")]);
    }

    #[test]
    fn test_multibyte_text_around_fence() {
        let (segments, blocks) = extract("Xin chào ```\nmã\n``` nhé");
        assert_eq!(blocks[0].code, "mã");
        assert_eq!(segments.first(), Some(&Segment::Text("Xin chào ")));
        assert_eq!(segments.last(), Some(&Segment::Text(" nhé")));
    }
}
