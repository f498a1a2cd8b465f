//! Block-level markup parsing.
//!
//! Line-oriented: fenced code blocks, headings, horizontal rules,
//! single-level blockquotes, unordered and ordered lists, paragraphs.
//! Blank lines separate blocks; blocks in the output are separated by a
//! single newline.

use std::fmt::Write;

use crate::escape::{escape_attr, escape_html};
use crate::fence::{Fence, detect_fence, is_closing_fence};
use crate::inline::render_inline;

/// Render raw note markup to HTML.
///
/// The output is not yet safe for embedding: literal HTML in the input
/// passes through unchanged and must go through the sanitize stage.
/// Empty input produces empty output.
#[must_use]
pub fn transform(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let mut out = String::with_capacity(raw.len() + raw.len() / 4);
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }

        if let Some(fence) = detect_fence(line) {
            // An unterminated fence is ordinary paragraph text.
            if let Some(close) = find_closing_fence(&lines, i + 1, &fence) {
                render_code_block(&fence, &lines[i + 1..close], &mut out);
                i = close + 1;
                continue;
            }
        }

        if let Some((level, rest)) = heading(line) {
            write!(out, "<h{level}>").unwrap();
            render_inline(rest.trim(), &mut out);
            write!(out, "</h{level}>").unwrap();
            i += 1;
            continue;
        }

        if is_rule(line) {
            out.push_str("<hr>");
            i += 1;
            continue;
        }

        if is_quote_line(line) {
            let start = i;
            while i < lines.len() && is_quote_line(lines[i]) {
                i += 1;
            }
            let content: Vec<&str> = lines[start..i].iter().map(|l| strip_quote_marker(l)).collect();
            out.push_str("<blockquote><p>");
            render_inline(&content.join("\n"), &mut out);
            out.push_str("</p></blockquote>");
            continue;
        }

        if unordered_item(line).is_some() {
            out.push_str("<ul>");
            while let Some(item) = lines.get(i).copied().and_then(unordered_item) {
                out.push_str("<li>");
                render_inline(item, &mut out);
                out.push_str("</li>");
                i += 1;
            }
            out.push_str("</ul>");
            continue;
        }

        if ordered_item(line).is_some() {
            out.push_str("<ol>");
            while let Some(item) = lines.get(i).copied().and_then(ordered_item) {
                out.push_str("<li>");
                render_inline(item, &mut out);
                out.push_str("</li>");
                i += 1;
            }
            out.push_str("</ol>");
            continue;
        }

        // Paragraph: runs until a blank line or the start of another block.
        let start = i;
        i += 1;
        while i < lines.len() && !starts_block(&lines, i) {
            i += 1;
        }
        out.push_str("<p>");
        render_inline(&lines[start..i].join("\n"), &mut out);
        out.push_str("</p>");
    }

    out
}

fn render_code_block(fence: &Fence, content: &[&str], out: &mut String) {
    match fence.language() {
        Some(lang) => {
            write!(out, r#"<pre><code class="language-{}">"#, escape_attr(lang)).unwrap();
        }
        None => out.push_str("<pre><code>"),
    }
    for line in content {
        out.push_str(&escape_html(line));
        out.push('\n');
    }
    out.push_str("</code></pre>");
}

fn find_closing_fence(lines: &[&str], from: usize, fence: &Fence) -> Option<usize> {
    (from..lines.len()).find(|&j| is_closing_fence(lines[j], fence))
}

/// `#`..`######` followed by a space; returns the level and the rest.
fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = trimmed[level..].strip_prefix(' ')?;
    Some((level, rest))
}

/// A line of three or more dashes and nothing else.
fn is_rule(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

fn is_quote_line(line: &str) -> bool {
    line.trim_start().starts_with('>')
}

fn strip_quote_marker(line: &str) -> &str {
    let stripped = line.trim_start().strip_prefix('>').unwrap_or(line);
    stripped.strip_prefix(' ').unwrap_or(stripped)
}

fn unordered_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .map(str::trim_start)
}

fn ordered_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    trimmed[digits..].strip_prefix(". ").map(str::trim_start)
}

/// Whether line `j` interrupts a paragraph by starting another block.
fn starts_block(lines: &[&str], j: usize) -> bool {
    let line = lines[j];
    if line.trim().is_empty() {
        return true;
    }
    if heading(line).is_some()
        || is_rule(line)
        || is_quote_line(line)
        || unordered_item(line).is_some()
        || ordered_item(line).is_some()
    {
        return true;
    }
    // A fence only interrupts when it actually closes somewhere below.
    match detect_fence(line) {
        Some(fence) => find_closing_fence(lines, j + 1, &fence).is_some(),
        None => false,
    }
}
