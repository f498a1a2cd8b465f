//! Auto-linking of bare URLs in text nodes.
//!
//! Runs after the policy walk, on the already-filtered tree. Text
//! inside `a` is never linkified (no anchors in anchors); `code` and
//! `pre` are skipped so literal code content is never rewritten.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::policy::AllowPolicy;
use crate::tree::{Element, HtmlNode};

/// Bare URL pattern; trailing punctuation is trimmed after matching.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("invalid URL regex"));

/// Elements whose text is never auto-linked.
const SKIP_ELEMENTS: &[&str] = &["a", "code", "pre"];

/// Wrap bare URLs in anchor elements.
///
/// Skipped entirely when the policy does not allow `a` elements.
pub(crate) fn linkify_fragment(nodes: Vec<HtmlNode>, policy: &AllowPolicy) -> Vec<HtmlNode> {
    if !policy.is_tag_allowed("a") {
        return nodes;
    }
    walk(nodes, policy)
}

fn walk(nodes: Vec<HtmlNode>, policy: &AllowPolicy) -> Vec<HtmlNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            HtmlNode::Element(mut element) => {
                if !SKIP_ELEMENTS.contains(&element.tag.as_str()) {
                    element.children = walk(element.children, policy);
                }
                out.push(HtmlNode::Element(element));
            }
            HtmlNode::Text(text) => linkify_text(&text, policy, &mut out),
        }
    }
    out
}

fn linkify_text(text: &str, policy: &AllowPolicy, out: &mut Vec<HtmlNode>) {
    let mut last = 0;
    for found in URL_PATTERN.find_iter(text) {
        let url = trim_trailing_punctuation(found.as_str());
        // Only link what the policy walk would itself keep.
        let linkable = Url::parse(url).is_ok_and(|u| policy.is_scheme_allowed(u.scheme()));
        if !linkable {
            continue;
        }
        if found.start() > last {
            out.push(HtmlNode::Text(text[last..found.start()].to_owned()));
        }
        let mut anchor = Element::new("a");
        anchor.attrs.push(("href".to_owned(), url.to_owned()));
        anchor.children.push(HtmlNode::Text(url.to_owned()));
        out.push(HtmlNode::Element(anchor));
        last = found.start() + url.len();
    }
    if last < text.len() {
        out.push(HtmlNode::Text(text[last..].to_owned()));
    }
}

/// Trim punctuation that belongs to the sentence rather than the URL.
/// A closing parenthesis is kept only while parentheses are balanced.
fn trim_trailing_punctuation(url: &str) -> &str {
    let mut trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
    while trimmed.ends_with(')')
        && trimmed.matches('(').count() < trimmed.matches(')').count()
    {
        trimmed = &trimmed[..trimmed.len() - 1];
        trimmed = trimmed.trim_end_matches(['.', ',', ';', ':', '!', '?']);
    }
    trimmed
}
