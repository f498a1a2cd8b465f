//! Inline markup parsing.
//!
//! Applied to the content of headings, list items, blockquotes and
//! paragraphs. Precedence, highest first: code spans, bold, italic,
//! links, line breaks. Code spans are atomic; bold, italic and link
//! matching never crosses a code span boundary. Any delimiter without a
//! closing counterpart renders as literal text.
//!
//! Ordinary text is emitted raw: embedded HTML must survive this stage
//! so the sanitize stage can judge it.

use std::fmt::Write;

use crate::escape::{escape_attr, escape_html};

/// Render inline markup into `out`.
pub(crate) fn render_inline(text: &str, out: &mut String) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'`' => {
                match find_byte(bytes, i + 1, b'`') {
                    // An empty span renders its delimiters literally.
                    Some(end) if end > i + 1 => {
                        out.push_str("<code>");
                        out.push_str(&escape_html(&text[i + 1..end]));
                        out.push_str("</code>");
                        i = end + 1;
                    }
                    _ => {
                        out.push('`');
                        i += 1;
                    }
                }
            }
            b'*' => {
                if bytes[i..].starts_with(b"**") {
                    if let Some(end) = find_delimiter(text, i + 2, "**") {
                        out.push_str("<strong>");
                        render_inline(&text[i + 2..end], out);
                        out.push_str("</strong>");
                        i = end + 2;
                    } else {
                        out.push_str("**");
                        i += 2;
                    }
                } else if let Some(end) = find_delimiter(text, i + 1, "*") {
                    out.push_str("<em>");
                    render_inline(&text[i + 1..end], out);
                    out.push_str("</em>");
                    i = end + 1;
                } else {
                    out.push('*');
                    i += 1;
                }
            }
            b'[' => {
                if let Some(link) = parse_link(text, i) {
                    write!(out, r#"<a href="{}">"#, escape_attr(link.url)).unwrap();
                    render_inline(link.label, out);
                    out.push_str("</a>");
                    i = link.end;
                } else {
                    out.push('[');
                    i += 1;
                }
            }
            b'\n' => {
                out.push_str("<br>");
                i += 1;
            }
            _ => {
                let Some(ch) = text[i..].chars().next() else {
                    break;
                };
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }
}

/// A parsed `[label](url)` construct.
struct Link<'a> {
    label: &'a str,
    url: &'a str,
    /// Byte offset just past the closing parenthesis.
    end: usize,
}

/// Parse a link starting at the `[` at byte offset `start`.
fn parse_link(text: &str, start: usize) -> Option<Link<'_>> {
    let bytes = text.as_bytes();
    let label_end = find_delimiter(text, start + 1, "]")?;
    if bytes.get(label_end + 1) != Some(&b'(') {
        return None;
    }
    let url_end = find_byte(bytes, label_end + 2, b')')?;
    Some(Link {
        label: &text[start + 1..label_end],
        url: text[label_end + 2..url_end].trim(),
        end: url_end + 1,
    })
}

/// Find `delim` at or after `from`, skipping over code spans.
///
/// Delimiters are ASCII, so byte positions returned here are always
/// valid char boundaries.
fn find_delimiter(text: &str, from: usize, delim: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = delim.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            // Mirror the code span rule: a non-empty span is skipped
            // whole, an empty or unterminated one is literal.
            if let Some(close) = find_byte(bytes, i + 1, b'`') {
                if close > i + 1 {
                    i = close + 1;
                    continue;
                }
            }
        }
        if bytes[i..].starts_with(needle) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == byte)
        .map(|pos| from + pos)
}
