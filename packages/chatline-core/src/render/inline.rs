//! Inline formatting tokenizer.
//!
//! Turns one escaped text segment into a small token tree: `**strong**`,
//! `*emphasis*`, `` `code` `` and line breaks. Strong and emphasis spans
//! never cross a newline; code spans may, and are opaque to the emphasis
//! rules. `****` is an empty strong span, while empty emphasis and empty
//! code spans stay literal.

/// An inline token. Text slices borrow from the escaped source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inline<'a> {
    Text(&'a str),
    Strong(Vec<Inline<'a>>),
    Emphasis(Vec<Inline<'a>>),
    Code(&'a str),
    LineBreak,
}

#[derive(Clone, Copy)]
enum Delim {
    Single,
    Double,
}

/// Tokenize an escaped text segment.
pub(crate) fn tokenize(text: &str) -> Vec<Inline<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    // All delimiters are ASCII, so every index we slice at is a char boundary.
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                push_text(&mut tokens, &text[literal_start..i]);
                tokens.push(Inline::LineBreak);
                i += 1;
                literal_start = i;
            }
            b'`' => match code_span_end(text, i) {
                Some(close) => {
                    push_text(&mut tokens, &text[literal_start..i]);
                    tokens.push(Inline::Code(&text[i + 1..close]));
                    i = close + 1;
                    literal_start = i;
                }
                None => i += 1,
            },
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                let inner = i + 2;
                match find_closer(text, inner, Delim::Double) {
                    Some(close) => {
                        push_text(&mut tokens, &text[literal_start..i]);
                        tokens.push(Inline::Strong(tokenize(&text[inner..close])));
                        i = close + 2;
                        literal_start = i;
                    }
                    // Let the second star try to open an emphasis span
                    None => i += 1,
                }
            }
            b'*' => {
                let inner = i + 1;
                match find_closer(text, inner, Delim::Single) {
                    Some(close) if close > inner => {
                        push_text(&mut tokens, &text[literal_start..i]);
                        tokens.push(Inline::Emphasis(tokenize(&text[inner..close])));
                        i = close + 1;
                        literal_start = i;
                    }
                    _ => i += 1,
                }
            }
            _ => i += 1,
        }
    }

    push_text(&mut tokens, &text[literal_start..]);
    tokens
}

/// Write tokens as markup.
pub(crate) fn emit(tokens: &[Inline<'_>], out: &mut String) {
    for token in tokens {
        match token {
            Inline::Text(text) => out.push_str(text),
            Inline::Strong(children) => {
                out.push_str("<strong>");
                emit(children, out);
                out.push_str("</strong>");
            }
            Inline::Emphasis(children) => {
                out.push_str("<em>");
                emit(children, out);
                out.push_str("</em>");
            }
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&code.replace('\n', "<br>"));
                out.push_str("</code>");
            }
            Inline::LineBreak => out.push_str("<br>"),
        }
    }
}

fn push_text<'a>(tokens: &mut Vec<Inline<'a>>, text: &'a str) {
    if !text.is_empty() {
        tokens.push(Inline::Text(text));
    }
}

/// Index of the backtick closing a code span opened at `open`.
fn code_span_end(text: &str, open: usize) -> Option<usize> {
    let close = text[open + 1..].find('`')?;
    (close > 0).then_some(open + 1 + close)
}

/// Find the delimiter closing a span whose content starts at `from`.
///
/// Code spans are skipped whole. A single-star span only closes on a lone
/// star; runs of two or more belong to strong spans.
fn find_closer(text: &str, from: usize, delim: Delim) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut j = from;

    while j < bytes.len() {
        match bytes[j] {
            b'\n' => return None,
            b'`' => match code_span_end(text, j) {
                // Emphasis cannot reach past a line break, even inside code
                Some(close) if text[j..close].contains('\n') => return None,
                Some(close) => j = close + 1,
                None => j += 1,
            },
            b'*' => {
                let run = bytes[j..].iter().take_while(|b| **b == b'*').count();
                match delim {
                    Delim::Double if run >= 2 => return Some(j),
                    Delim::Single if run == 1 => return Some(j),
                    _ => j += run,
                }
            }
            _ => j += 1,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(text: &str) -> String {
        let mut out = String::new();
        emit(&tokenize(text), &mut out);
        out
    }

    #[test]
    fn test_plain_text_is_one_token() {
        assert_eq!(tokenize("hello"), vec![Inline::Text("hello")]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_strong_emphasis_and_code() {
        assert_eq!(
            html("**a** *b* `c`"),
            "<strong>a</strong> <em>b</em> <code>c</code>"
        );
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(html("a\nb\n"), "a<br>b<br>");
    }

    #[test]
    fn test_code_span_is_opaque() {
        assert_eq!(html("`**not bold**`"), "<code>**not bold**</code>");
        assert_eq!(html("`*x*`"), "<code>*x*</code>");
    }

    #[test]
    fn test_nested_emphasis() {
        assert_eq!(
            html("**a *b* c**"),
            "<strong>a <em>b</em> c</strong>"
        );
        assert_eq!(
            html("*a **b** c*"),
            "<em>a <strong>b</strong> c</em>"
        );
        assert_eq!(
            html("**bold `code` bold**"),
            "<strong>bold <code>code</code> bold</strong>"
        );
    }

    #[test]
    fn test_closer_inside_code_span_is_ignored() {
        assert_eq!(
            html("**a `**` b**"),
            "<strong>a <code>**</code> b</strong>"
        );
    }

    #[test]
    fn test_emphasis_does_not_cross_newlines() {
        assert_eq!(html("**a\nb**"), "**a<br>b**");
        assert_eq!(html("*a\nb*"), "*a<br>b*");
        assert_eq!(html("**a `x\ny` b**"), "**a <code>x<br>y</code> b**");
    }

    #[test]
    fn test_code_span_crosses_newlines() {
        assert_eq!(html("`a\nb`"), "<code>a<br>b</code>");
        assert_eq!(
            tokenize("`a\nb` c"),
            vec![Inline::Code("a\nb"), Inline::Text(" c")]
        );
    }

    #[test]
    fn test_empty_strong_span() {
        assert_eq!(html("****"), "<strong></strong>");
        assert_eq!(html("a **** b"), "a <strong></strong> b");
    }

    #[test]
    fn test_other_empty_spans_stay_literal() {
        assert_eq!(html("**"), "**");
        assert_eq!(html("``"), "``");
        assert_eq!(html("a * b"), "a * b");
    }

    #[test]
    fn test_unmatched_double_star_falls_back_to_emphasis() {
        assert_eq!(html("**a*"), "*<em>a</em>");
    }

    #[test]
    fn test_double_backtick_then_code() {
        assert_eq!(html("``x`"), "`<code>x</code>");
    }

    #[test]
    fn test_multiple_spans_on_one_line() {
        assert_eq!(
            html("*one* and *two*"),
            "<em>one</em> and <em>two</em>"
        );
    }
}
