//! Message content rendering.
//!
//! Raw message text goes through a fixed pipeline:
//!
//! 1. HTML escaping (the only sanitization boundary)
//! 2. Fenced code block extraction into [`Segment`](fence::Segment)s
//! 3. Inline tokenization of the remaining text (strong, emphasis, code, breaks)
//! 4. Re-insertion of code blocks as copy-enabled `language-*` containers
//! 5. Wrapping with a whole-message copy control
//!
//! Rendering is total: malformed markup degrades to escaped literal text.

mod fence;
mod inline;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::CodeBlock;
use fence::Segment;

/// What the whole-message copy control copies.
///
/// The widget has always copied the formatted markup rather than the text the
/// user saw typed, so that stays the default. Hosts that want clean text can
/// opt into [`CopyAllSource::RawText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CopyAllSource {
    #[default]
    #[serde(rename = "formatted")]
    FormattedMarkup,
    #[serde(rename = "raw")]
    RawText,
}

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default)]
    pub copy_all: CopyAllSource,
}

/// Rendered markup for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    html: String,
    code_blocks: Vec<CodeBlock>,
    copy_all_text: String,
}

impl RenderedContent {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    /// Code blocks extracted while rendering, in order of appearance.
    pub fn code_blocks(&self) -> &[CodeBlock] {
        &self.code_blocks
    }

    /// Text the whole-message copy control puts on the clipboard.
    pub fn copy_all_text(&self) -> &str {
        &self.copy_all_text
    }
}

impl fmt::Display for RenderedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// Render a message with default options.
pub fn render(raw: &str) -> RenderedContent {
    render_with(raw, &RenderOptions::default())
}

/// Render a message.
pub fn render_with(raw: &str, options: &RenderOptions) -> RenderedContent {
    let escaped = escape_html(raw);
    let (segments, code_blocks) = fence::extract(&escaped);

    let mut body = String::with_capacity(escaped.len() + 64);
    for segment in &segments {
        match segment {
            Segment::Text(text) => inline::emit(&inline::tokenize(text), &mut body),
            Segment::Fence(index) => push_code_block(&code_blocks[*index], &mut body),
        }
    }

    let copy_source = match options.copy_all {
        CopyAllSource::FormattedMarkup => body.as_str(),
        CopyAllSource::RawText => raw,
    };
    let copy_argument = escape_html(&escape_template_literal(copy_source));

    let mut html = String::with_capacity(body.len() + copy_argument.len() + 160);
    html.push_str(r#"<div class="message-content-wrapper">"#);
    html.push_str(&body);
    push_copy_button(&copy_argument, "Copy All", &mut html);
    html.push_str("</div>");

    RenderedContent {
        html,
        code_blocks,
        copy_all_text: copy_source.to_string(),
    }
}

/// Escape text for use in HTML content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_html`].
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Escape text for a JavaScript template literal argument.
fn escape_template_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

fn push_code_block(block: &CodeBlock, out: &mut String) {
    // The code is already escaped, so it is safe both as content and inside
    // the double-quoted handler attribute.
    out.push_str(r#"<div class="code-wrapper">"#);
    push_copy_button(&escape_template_literal(&block.code), "Copy", out);
    out.push_str(r#"<pre><code class="language-"#);
    out.push_str(&block.language);
    out.push_str(r#"">"#);
    out.push_str(&block.code);
    out.push_str("</code></pre></div>");
}

fn push_copy_button(argument: &str, label: &str, out: &mut String) {
    out.push_str(r#"<button class="copy-btn" onclick="copyText(`"#);
    out.push_str(argument);
    out.push_str(r#"`, this)"><i class="fas fa-copy"></i> "#);
    out.push_str(label);
    out.push_str("</button>");
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAPPER_OPEN: &str = r#"<div class="message-content-wrapper">"#;

    /// Body between the wrapper open tag and the trailing copy-all button.
    fn body(rendered: &RenderedContent) -> &str {
        let html = rendered.as_str();
        let start = WRAPPER_OPEN.len();
        let end = html.rfind(r#"<button class="copy-btn""#).unwrap();
        &html[start..end]
    }

    /// Arguments of every `copyText(...)` call, decoded the way a browser
    /// would: attribute entities first, then the template literal.
    fn copy_arguments(html: &str) -> Vec<String> {
        let mut args = Vec::new();
        let mut rest = html;
        while let Some(start) = rest.find("copyText(`") {
            let after = &rest[start + "copyText(`".len()..];
            let attribute = &after[..after.find("`, this)\"").unwrap_or(after.len())];
            let decoded = unescape_html(attribute);
            let mut literal = String::new();
            let mut chars = decoded.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => literal.extend(chars.next()),
                    '`' => break,
                    _ => literal.push(c),
                }
            }
            args.push(literal);
            rest = after;
        }
        args
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let text = r#"<a href="x">'&amp;'</a>"#;
        assert_eq!(unescape_html(&escape_html(text)), text);
    }

    #[test]
    fn test_user_markup_is_escaped() {
        let rendered = render("<script>alert('x')</script> & <b>hi</b>");
        let body = body(&rendered);
        assert!(!body.contains('<'));
        assert!(!body.contains('>'));
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("&amp;"));
    }

    #[test]
    fn test_inline_formatting() {
        let rendered = render("**a** *b* `c`");
        assert_eq!(
            body(&rendered),
            "<strong>a</strong> <em>b</em> <code>c</code>"
        );
    }

    #[test]
    fn test_single_fenced_block() {
        let rendered = render("```js\nconsole.log(1)\n```");
        let html = rendered.as_str();

        assert!(html.contains(r#"<code class="language-js">console.log(1)</code>"#));
        assert_eq!(rendered.code_blocks().len(), 1);
        assert_eq!(rendered.code_blocks()[0].code, "console.log(1)");

        let args = copy_arguments(html);
        assert_eq!(args[0], "console.log(1)");
    }

    #[test]
    fn test_two_blocks_keep_order() {
        let rendered = render("first:\n```py\nprint(1)\n```\nsecond:\n```rs\nfn main() {}\n```");
        let html = rendered.as_str();

        let py = html.find("language-py").unwrap();
        let rs = html.find("language-rs").unwrap();
        assert!(py < rs);

        let args = copy_arguments(html);
        assert_eq!(args[0], "print(1)");
        assert_eq!(args[1], "fn main() {}");
        assert!(body(&rendered).starts_with("first:<br>"));
    }

    #[test]
    fn test_block_without_language_is_plaintext() {
        let rendered = render("```\nplain\n```");
        assert!(rendered
            .as_str()
            .contains(r#"<code class="language-plaintext">plain</code>"#));
    }

    #[test]
    fn test_code_with_backticks_round_trips() {
        let code = "let s = `a ${b}` + '\\n' + \"<tag>\";";
        let rendered = render(&format!("```js\n{code}\n```"));
        let args = copy_arguments(rendered.as_str());
        assert_eq!(args[0], code);
    }

    #[test]
    fn test_emphasis_inside_block_is_untouched() {
        let rendered = render("```\n**x** *y* `z`\n```");
        assert!(rendered.as_str().contains(">**x** *y* `z`</code>"));
        assert!(!rendered.as_str().contains("<strong>"));
    }

    #[test]
    fn test_unterminated_fence_is_literal() {
        let rendered = render("```js\nlet x = 1;");
        assert!(rendered.code_blocks().is_empty());
        assert_eq!(body(&rendered), "```js<br>let x = 1;");
    }

    #[test]
    fn test_placeholder_text_is_not_substituted() {
        let rendered = render("__CODE_BLOCK_0__\n```\nx\n```");
        assert!(body(&rendered).starts_with("__CODE_BLOCK_0__<br>"));
    }

    #[test]
    fn test_empty_input() {
        let rendered = render("");
        assert_eq!(body(&rendered), "");
        assert!(rendered.code_blocks().is_empty());
        assert_eq!(copy_arguments(rendered.as_str()), vec![String::new()]);
        assert!(rendered.as_str().ends_with("Copy All</button></div>"));
    }

    #[test]
    fn test_copy_all_defaults_to_formatted_markup() {
        let rendered = render("**hi** <x>");
        let args = copy_arguments(rendered.as_str());
        assert_eq!(args.last().unwrap(), "<strong>hi</strong> &lt;x&gt;");
    }

    #[test]
    fn test_copy_all_raw_text() {
        let options = RenderOptions {
            copy_all: CopyAllSource::RawText,
        };
        let raw = "**hi** `x` <y>";
        let rendered = render_with(raw, &options);
        let args = copy_arguments(rendered.as_str());
        assert_eq!(args.last().unwrap(), raw);
        assert_eq!(rendered.copy_all_text(), raw);
        // Formatting of the visible body is unchanged
        assert!(rendered.as_str().contains("<strong>hi</strong>"));
    }

    #[test]
    fn test_copy_all_attribute_is_well_formed() {
        let rendered = render("```\nx\n```");
        let html = rendered.as_str();
        let copy_all = &html[html.rfind("onclick=\"").unwrap() + 9..];
        let attribute_end = copy_all.find('"').unwrap();
        assert!(copy_all[..attribute_end].ends_with("`, this)"));
    }

    #[test]
    fn test_rendering_is_not_idempotent() {
        let first = render("<b>");
        let second = render(body(&first));
        assert_eq!(body(&first), "&lt;b&gt;");
        assert_eq!(body(&second), "&amp;lt;b&amp;gt;");
    }

    #[test]
    fn test_display_matches_as_str() {
        let rendered = render("*x*");
        assert_eq!(rendered.to_string(), rendered.as_str());
    }

    #[test]
    fn test_copy_all_source_config_names() {
        let options: RenderOptions = serde_json::from_str(r#"{"copy_all":"raw"}"#).unwrap();
        assert_eq!(options.copy_all, CopyAllSource::RawText);
        let options: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.copy_all, CopyAllSource::FormattedMarkup);
    }
}
