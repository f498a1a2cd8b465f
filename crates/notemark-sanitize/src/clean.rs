//! Policy walk: allow-list filtering of the parsed tree.

use tracing::debug;
use url::Url;

use crate::policy::AllowPolicy;
use crate::tree::{Element, HtmlNode};

/// Disallowed elements whose content is dropped along with the element.
/// Everything else is unwrapped so readable text survives.
const DROP_CONTENT_ELEMENTS: &[&str] = &["script", "style"];

/// Attributes whose values name a URL and are subject to scheme checks.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "cite"];

/// Filter a fragment against the policy.
pub(crate) fn clean_fragment(nodes: Vec<HtmlNode>, policy: &AllowPolicy) -> Vec<HtmlNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            HtmlNode::Text(text) => push_text(&mut out, text),
            HtmlNode::Element(element) => clean_element(element, policy, &mut out),
        }
    }
    out
}

fn clean_element(element: Element, policy: &AllowPolicy, out: &mut Vec<HtmlNode>) {
    if !policy.is_tag_allowed(&element.tag) {
        if DROP_CONTENT_ELEMENTS.contains(&element.tag.as_str()) {
            debug!(tag = %element.tag, "dropped element and its content");
            return;
        }
        debug!(tag = %element.tag, "unwrapped disallowed element");
        for child in clean_fragment(element.children, policy) {
            match child {
                HtmlNode::Text(text) => push_text(out, text),
                node => out.push(node),
            }
        }
        return;
    }

    let mut kept = Element::new(element.tag);
    for (name, value) in element.attrs {
        if !policy.is_attr_allowed(&kept.tag, &name) {
            debug!(tag = %kept.tag, attr = %name, "dropped disallowed attribute");
            continue;
        }
        if URL_ATTRIBUTES.contains(&name.as_str()) && !is_url_permitted(&value, policy) {
            debug!(tag = %kept.tag, attr = %name, "dropped attribute with disallowed URL");
            continue;
        }
        kept.attrs.push((name, value));
    }
    kept.children = clean_fragment(element.children, policy);
    out.push(HtmlNode::Element(kept));
}

/// Merge adjacent text nodes produced by unwrapping.
fn push_text(out: &mut Vec<HtmlNode>, text: String) {
    if let Some(HtmlNode::Text(prev)) = out.last_mut() {
        prev.push_str(&text);
    } else {
        out.push(HtmlNode::Text(text));
    }
}

/// Whether a URL-bearing attribute value may be kept.
///
/// Absolute URLs must carry an allowed scheme. Relative references
/// (no scheme) are kept; values that do not parse at all are dropped.
/// WHATWG parsing lowercases the scheme and strips embedded tab and
/// newline characters, so cased or split `javascript:` spellings are
/// still recognized.
fn is_url_permitted(value: &str, policy: &AllowPolicy) -> bool {
    match Url::parse(value) {
        Ok(url) => policy.is_scheme_allowed(url.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fragment;
    use crate::serializer::serialize_fragment;

    fn clean(html: &str) -> String {
        let policy = AllowPolicy::default();
        serialize_fragment(&clean_fragment(parse_fragment(html), &policy))
    }

    #[test]
    fn test_allowed_markup_untouched() {
        assert_eq!(
            clean("<p><strong>vet</strong> en <code>code</code></p>"),
            "<p><strong>vet</strong> en <code>code</code></p>"
        );
    }

    #[test]
    fn test_script_dropped_with_content() {
        assert_eq!(clean("voor<script>alert('xss');</script>na"), "voorna");
    }

    #[test]
    fn test_style_dropped_with_content() {
        assert_eq!(clean("<style>p { color: red }</style>tekst"), "tekst");
    }

    #[test]
    fn test_disallowed_element_unwrapped() {
        assert_eq!(clean("<div><p>binnen</p></div>"), "<p>binnen</p>");
        assert_eq!(clean("een <u>twee</u> drie"), "een twee drie");
    }

    #[test]
    fn test_img_removed_entirely() {
        // img is not allow-listed and has no content to keep.
        assert_eq!(clean("<p><img src=x onerror=alert(1)></p>"), "<p></p>");
    }

    #[test]
    fn test_event_handler_attribute_dropped() {
        assert_eq!(
            clean(r#"<a href="https://example.com" onclick="evil()">x</a>"#),
            r#"<a href="https://example.com">x</a>"#
        );
    }

    #[test]
    fn test_javascript_scheme_dropped() {
        assert_eq!(clean(r#"<a href="javascript:alert(1)">x</a>"#), "<a>x</a>");
    }

    #[test]
    fn test_cased_scheme_dropped() {
        assert_eq!(clean(r#"<a href="JaVaScRiPt:alert(1)">x</a>"#), "<a>x</a>");
    }

    #[test]
    fn test_split_scheme_dropped() {
        assert_eq!(
            clean("<a href=\"java\tscript:alert(1)\">x</a>"),
            "<a>x</a>"
        );
    }

    #[test]
    fn test_relative_href_kept() {
        assert_eq!(clean(r#"<a href="/notes/7">x</a>"#), r#"<a href="/notes/7">x</a>"#);
    }

    #[test]
    fn test_mailto_kept() {
        assert_eq!(
            clean(r#"<a href="mailto:sam@example.com">mail</a>"#),
            r#"<a href="mailto:sam@example.com">mail</a>"#
        );
    }

    #[test]
    fn test_data_scheme_dropped() {
        assert_eq!(
            clean(r#"<a href="data:text/html;base64,PHNjcmlwdD4=">x</a>"#),
            "<a>x</a>"
        );
    }

    #[test]
    fn test_unwrap_merges_surrounding_text() {
        assert_eq!(clean("a<u>b</u>c"), "abc");
    }

    #[test]
    fn test_nested_disallowed_inside_allowed() {
        assert_eq!(
            clean("<p>a<span onclick=x>b</span><u>c</u></p>"),
            "<p>a<span>b</span>c</p>"
        );
    }

    #[test]
    fn test_custom_policy_restricts_further() {
        let policy = AllowPolicy::from_toml_str(
            "allowed_tags = [\"p\"]\nallowed_attributes = {}\nallowed_url_schemes = [\"https\"]\n",
        )
        .unwrap();
        let nodes = clean_fragment(parse_fragment("<p><strong>x</strong></p>"), &policy);
        assert_eq!(serialize_fragment(&nodes), "<p>x</p>");
    }
}
