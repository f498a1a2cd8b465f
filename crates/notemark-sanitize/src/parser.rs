//! Lenient HTML parsing into a node tree.
//!
//! The input is trusted-malicious: mismatched and unclosed tags, mixed
//! case, unquoted attributes, stray `<`, NUL bytes and comment tricks
//! all have to produce *some* tree rather than an error. The parser
//! therefore recovers on everything: unmatched end tags are dropped,
//! open elements are closed at end of input, and anything that is not
//! recognizable markup is ordinary text.

use std::borrow::Cow;

use crate::entities::decode_entities;
use crate::tree::{Element, HtmlNode, is_void_element};

/// Maximum element nesting depth; elements opened deeper are flattened
/// into their ancestor.
const MAX_DEPTH: usize = 256;

/// Elements whose content is raw text up to the matching close tag.
/// These never self-close, matching browser parsing.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Parse an HTML fragment into a list of top-level nodes.
pub(crate) fn parse_fragment(html: &str) -> Vec<HtmlNode> {
    let html = strip_nul(html);
    Parser::new(&html).run()
}

fn strip_nul(html: &str) -> Cow<'_, str> {
    if html.contains('\0') {
        Cow::Owned(html.chars().filter(|&c| c != '\0').collect())
    } else {
        Cow::Borrowed(html)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    root: Vec<HtmlNode>,
    stack: Vec<Element>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<HtmlNode> {
        let input = self.input;
        while self.pos < input.len() {
            match input[self.pos..].find('<') {
                Some(0) => self.markup(),
                Some(offset) => {
                    let end = self.pos + offset;
                    let chunk = &input[self.pos..end];
                    self.append_text(decode_entities(chunk));
                    self.pos = end;
                }
                None => {
                    let chunk = &input[self.pos..];
                    self.append_text(decode_entities(chunk));
                    self.pos = input.len();
                }
            }
        }
        // Close everything left open.
        while let Some(element) = self.stack.pop() {
            self.append(HtmlNode::Element(element));
        }
        self.root
    }

    fn append(&mut self, node: HtmlNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    /// Append text, merging with a preceding text node.
    fn append_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let children = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };
        if let Some(HtmlNode::Text(prev)) = children.last_mut() {
            prev.push_str(&text);
        } else {
            children.push(HtmlNode::Text(text));
        }
    }

    /// Dispatch on the construct at the current `<`.
    fn markup(&mut self) {
        let input = self.input;
        let rest = &input[self.pos..];
        if rest.starts_with("<!--") {
            // Comment; an unterminated one swallows the rest.
            self.pos = match input[self.pos + 4..].find("-->") {
                Some(offset) => self.pos + 4 + offset + 3,
                None => input.len(),
            };
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            // Doctype, CDATA or processing instruction; all discarded.
            self.pos = match input[self.pos..].find('>') {
                Some(offset) => self.pos + offset + 1,
                None => input.len(),
            };
        } else if rest.starts_with("</") {
            self.end_tag();
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.start_tag();
        } else {
            // Stray '<' is ordinary text.
            self.append_text("<".to_owned());
            self.pos += 1;
        }
    }

    fn end_tag(&mut self) {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut i = self.pos + 2;
        let name_start = i;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name = input[name_start..i].to_ascii_lowercase();
        self.pos = match input[i..].find('>') {
            Some(offset) => i + offset + 1,
            None => input.len(),
        };
        if name.is_empty() {
            return;
        }
        // Close up to the matching open element; implicitly closing
        // anything opened in between. Unmatched end tags are dropped.
        if let Some(open_idx) = self.stack.iter().rposition(|el| el.tag == name) {
            while self.stack.len() > open_idx {
                match self.stack.pop() {
                    Some(element) => self.append(HtmlNode::Element(element)),
                    None => break,
                }
            }
        }
    }

    fn start_tag(&mut self) {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut i = self.pos + 1;
        let name_start = i;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        let mut element = Element::new(input[name_start..i].to_ascii_lowercase());

        let mut self_closing = false;
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    // Stray '/' inside the tag.
                    i += 1;
                }
                _ => i = parse_attribute(input, &mut element, i),
            }
        }
        self.pos = i;

        if RAW_TEXT_ELEMENTS.contains(&element.tag.as_str()) {
            self.raw_text(element);
        } else if self_closing || is_void_element(&element.tag) || self.stack.len() >= MAX_DEPTH {
            self.append(HtmlNode::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    /// Consume raw text content up to the matching case-insensitive
    /// close tag and attach it to `element`.
    fn raw_text(&mut self, mut element: Element) {
        let input = self.input;
        let rest = &input[self.pos..];
        let close = find_close_tag_ci(rest, &element.tag);
        match close {
            Some(offset) => {
                if offset > 0 {
                    element
                        .children
                        .push(HtmlNode::Text(rest[..offset].to_owned()));
                }
                let after = self.pos + offset;
                self.pos = match input[after..].find('>') {
                    Some(o) => after + o + 1,
                    None => input.len(),
                };
            }
            None => {
                if !rest.is_empty() {
                    element.children.push(HtmlNode::Text(rest.to_owned()));
                }
                self.pos = input.len();
            }
        }
        self.append(HtmlNode::Element(element));
    }
}

/// Find `</tag` case-insensitively; returns the byte offset of the `<`.
///
/// Works on bytes: raw text may hold multibyte characters at any
/// offset, so `str` slicing is not an option here.
fn find_close_tag_ci(haystack: &str, tag: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let needle = tag.as_bytes();
    let mut i = 0;
    while i + 2 + needle.len() <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + 2 + needle.len()].eq_ignore_ascii_case(needle)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-'
}

/// Parse one attribute starting at `i`; returns the new position.
///
/// Handles double-quoted, single-quoted, unquoted and valueless forms.
/// The first occurrence of a duplicated name wins.
fn parse_attribute(input: &str, element: &mut Element, i: usize) -> usize {
    let bytes = input.as_bytes();
    let name_start = i;
    let mut i = i;
    while i < bytes.len()
        && !bytes[i].is_ascii_whitespace()
        && !matches!(bytes[i], b'=' | b'>' | b'/')
    {
        i += 1;
    }
    let name = input[name_start..i].to_ascii_lowercase();

    let mut j = i;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    let mut value = String::new();
    if bytes.get(j) == Some(&b'=') {
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        match bytes.get(j) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = j + 1;
                match bytes[value_start..].iter().position(|&b| b == quote) {
                    Some(len) => {
                        value = decode_entities(&input[value_start..value_start + len]);
                        j = value_start + len + 1;
                    }
                    None => {
                        // Unterminated quote swallows the rest.
                        value = decode_entities(&input[value_start..]);
                        j = bytes.len();
                    }
                }
            }
            _ => {
                let value_start = j;
                while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                    j += 1;
                }
                value = decode_entities(&input[value_start..j]);
            }
        }
        i = j;
    }

    if !name.is_empty() && !element.attrs.iter().any(|(existing, _)| existing == &name) {
        element.attrs.push((name, value));
    }
    i
}
