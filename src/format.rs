//! Message formatting.
//!
//! Assistant text is split by a single left-to-right scan into typed
//! [`Span`]s: plain text, inline code delimited by single backticks, and
//! fenced code blocks delimited by triple backticks with an optional language
//! tag.  Renderers work from the spans; [`to_markup`] produces an HTML
//! fragment in which every piece of message text is escaped, so formatting
//! never injects markup of its own beyond the fixed wrappers.

/// Delimiter of a fenced code block.
pub const FENCE: &str = "```";

/// Header label of a fenced block without a language tag.
pub const DEFAULT_CODE_LABEL: &str = "code";

/// One piece of a formatted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// Plain text, shown as written.
    Text(&'a str),

    /// Inline code; the text between a pair of single backticks.
    InlineCode(&'a str),

    /// A fenced code block with its body trimmed.
    CodeBlock {
        /// Language tag written after the opening fence.
        language: Option<&'a str>,
        /// Code between the fences, trimmed.
        code: &'a str,
    },
}

impl Span<'_> {
    /// Header label of a code block: its language, or `code`.
    pub fn label(&self) -> Option<&str> {
        match self {
            Span::CodeBlock { language, .. } => Some(language.unwrap_or(DEFAULT_CODE_LABEL)),
            _ => None,
        }
    }
}

/// Split `text` into spans.
///
/// The scan never fails.  A fence opens a block only when a line break follows
/// it (after the optional language tag) and a closing fence appears later;
/// otherwise its backticks stay in the surrounding text and scanning goes on.
/// A backtick that has no partner on its right, or whose partner opens a
/// block, stays in the surrounding text too.
pub fn tokenize(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while let Some(offset) = text[i..].find('`') {
        let tick = i + offset;

        if text[tick..].starts_with(FENCE) {
            match code_block(text, tick) {
                Some((block, next)) => {
                    push_text(&mut spans, &text[text_start..tick]);
                    spans.push(block);
                    i = next;
                    text_start = next;
                }
                None => i = tick + FENCE.len(),
            }
            continue;
        }

        let inner_start = tick + 1;
        match text[inner_start..].find('`') {
            Some(len) if len > 0 && code_block(text, inner_start + len).is_none() => {
                push_text(&mut spans, &text[text_start..tick]);
                spans.push(Span::InlineCode(&text[inner_start..inner_start + len]));
                i = inner_start + len + 1;
                text_start = i;
            }
            _ => {
                i = inner_start;
            }
        }
    }

    push_text(&mut spans, &text[text_start..]);
    spans
}

/// Render `text` as an HTML fragment.
///
/// Text is escaped; inline code becomes `<code class="inline-code">` and fenced
/// blocks become a `code-block` container with a `code-header` label and a
/// `code-content` body.  Backticks in the output are written as `&#96;`.
pub fn to_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for span in tokenize(text) {
        match span {
            Span::Text(text) => push_escaped(&mut out, text),
            Span::InlineCode(code) => {
                out.push_str(r#"<code class="inline-code">"#);
                push_escaped(&mut out, code);
                out.push_str("</code>");
            }
            Span::CodeBlock { language, code } => {
                out.push_str(r#"<div class="code-block"><div class="code-header">"#);
                push_escaped(&mut out, language.unwrap_or(DEFAULT_CODE_LABEL));
                out.push_str(r#"</div><pre class="code-content">"#);
                push_escaped(&mut out, code);
                out.push_str("</pre></div>");
            }
        }
    }
    out
}

fn push_text<'a>(spans: &mut Vec<Span<'a>>, text: &'a str) {
    if !text.is_empty() {
        spans.push(Span::Text(text));
    }
}

/// The block opened by a fence at `tick`, and the offset just past its close.
fn code_block(text: &str, tick: usize) -> Option<(Span<'_>, usize)> {
    if !text[tick..].starts_with(FENCE) {
        return None;
    }
    let (language, body_start) = fence_header(text, tick + FENCE.len())?;
    let close = body_start + text[body_start..].find(FENCE)?;
    let block = Span::CodeBlock {
        language,
        code: text[body_start..close].trim(),
    };
    Some((block, close + FENCE.len()))
}

/// Parse the optional language tag after an opening fence.
///
/// Returns `None` unless a line break follows the tag (or the fence) directly.
fn fence_header(text: &str, start: usize) -> Option<(Option<&str>, usize)> {
    let rest = &text[start..];
    let tag_len = rest
        .find(|c: char| !is_tag_char(c))
        .unwrap_or(rest.len());
    let after_tag = &rest[tag_len..];
    let newline = if after_tag.starts_with("\r\n") {
        2
    } else if after_tag.starts_with('\n') {
        1
    } else {
        return None;
    };
    let language = if tag_len > 0 {
        Some(&rest[..tag_len])
    } else {
        None
    };
    Some((language, start + tag_len + newline))
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '-' | '.')
}

fn push_escaped(out: &mut String, text: &str) {
    for c in html_escape::encode_text(text).chars() {
        if c == '`' {
            out.push_str("&#96;");
        } else {
            out.push(c);
        }
    }
}
