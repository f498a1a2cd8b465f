//! Serialization of the sanitized tree back to an HTML string.

use std::fmt::Write;

use crate::tree::{HtmlNode, is_void_element};

/// Serialize a fragment to HTML5 text.
pub(crate) fn serialize_fragment(nodes: &[HtmlNode]) -> String {
    let mut out = String::with_capacity(4096);
    for node in nodes {
        serialize_node(node, &mut out);
    }
    out
}

fn serialize_node(node: &HtmlNode, out: &mut String) {
    match node {
        HtmlNode::Text(text) => out.push_str(&escape_text(text)),
        HtmlNode::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                if value.is_empty() {
                    write!(out, " {name}").unwrap();
                } else {
                    write!(out, r#" {}="{}""#, name, escape_attr(value)).unwrap();
                }
            }
            out.push('>');
            if is_void_element(&element.tag) {
                return;
            }
            for child in &element.children {
                serialize_node(child, out);
            }
            write!(out, "</{}>", element.tag).unwrap();
        }
    }
}

/// Escape text for HTML content.
fn escape_text(text: &str) -> String {
    escape_html(text, false)
}

/// Escape text for double-quoted attribute values.
fn escape_attr(text: &str) -> String {
    escape_html(text, true)
}

fn escape_html(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            '\'' if escape_quotes => result.push_str("&#39;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Element;

    #[test]
    fn test_serialize_text_escapes() {
        let nodes = vec![HtmlNode::Text("a < b & c > d".to_owned())];
        assert_eq!(serialize_fragment(&nodes), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_serialize_element_with_children() {
        let mut p = Element::new("p");
        p.children.push(HtmlNode::Text("x".to_owned()));
        assert_eq!(serialize_fragment(&[HtmlNode::Element(p)]), "<p>x</p>");
    }

    #[test]
    fn test_serialize_attributes() {
        let mut a = Element::new("a");
        a.attrs.push(("href".to_owned(), "/x".to_owned()));
        a.attrs.push(("title".to_owned(), r#"zeg "hoi""#.to_owned()));
        a.children.push(HtmlNode::Text("y".to_owned()));
        assert_eq!(
            serialize_fragment(&[HtmlNode::Element(a)]),
            r#"<a href="/x" title="zeg &quot;hoi&quot;">y</a>"#
        );
    }

    #[test]
    fn test_serialize_valueless_attribute() {
        let mut td = Element::new("td");
        td.attrs.push(("align".to_owned(), String::new()));
        assert_eq!(serialize_fragment(&[HtmlNode::Element(td)]), "<td align></td>");
    }

    #[test]
    fn test_serialize_void_element() {
        let nodes = vec![
            HtmlNode::Text("a".to_owned()),
            HtmlNode::Element(Element::new("br")),
            HtmlNode::Text("b".to_owned()),
        ];
        assert_eq!(serialize_fragment(&nodes), "a<br>b");
    }

    #[test]
    fn test_serialize_empty_non_void_gets_end_tag() {
        let p = Element::new("p");
        assert_eq!(serialize_fragment(&[HtmlNode::Element(p)]), "<p></p>");
    }
}
