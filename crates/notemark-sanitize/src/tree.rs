//! Node tree shared by the parse, clean, auto-link and serialize passes.

/// A node in the parsed HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HtmlNode {
    Element(Element),
    Text(String),
}

/// An element with its attributes and children.
///
/// Tag and attribute names are stored lowercased; attribute order is
/// preserved and the first occurrence of a duplicated name wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<HtmlNode>,
}

impl Element {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// HTML5 void elements: no content, no end tag.
pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("br"));
        assert!(is_void_element("img"));
        assert!(!is_void_element("p"));
        assert!(!is_void_element("script"));
    }
}
