//! Character reference decoding.
//!
//! Text and attribute values are decoded to plain characters during
//! parsing, so escaping is canonical when the tree is serialized again.
//! Unknown named references are preserved as written.

use std::sync::LazyLock;

use regex::Regex;

/// Pattern for numeric and named character references.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX]?[0-9a-fA-F]+|[a-zA-Z]+);").expect("invalid character reference regex")
});

/// Decode character references in `text`.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    REFERENCE_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            decode_reference(&caps[1]).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

fn decode_reference(name: &str) -> Option<String> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        // NUL never round-trips into output.
        let ch = char::from_u32(code).filter(|&c| c != '\0')?;
        return Some(ch.to_string());
    }
    named_entity(name).map(str::to_owned)
}

/// Map a named entity to its character value.
fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00a0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "hellip" => "\u{2026}",
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_entities() {
        assert_eq!(decode_entities("a &lt; b &amp; c &gt; d"), "a < b & c > d");
        assert_eq!(decode_entities("&quot;x&quot; &apos;y&apos;"), "\"x\" 'y'");
    }

    #[test]
    fn test_named_entities() {
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00a0}b");
        assert_eq!(decode_entities("x&mdash;y"), "x\u{2014}y");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_entities("&#65;"), "A");
        assert_eq!(decode_entities("&#x41;"), "A");
        assert_eq!(decode_entities("&#X41;"), "A");
    }

    #[test]
    fn test_unknown_entity_preserved() {
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_bare_ampersand_preserved() {
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
    }

    #[test]
    fn test_nul_reference_dropped() {
        assert_eq!(decode_entities("a&#0;b"), "a&#0;b");
    }

    #[test]
    fn test_invalid_codepoint_preserved() {
        // Lone surrogate is not a char.
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
    }
}
